use std::sync::Arc;

use iocraft::prelude::*;

use crate::actions::issue_actions;
use crate::app::{Bus, ViewKind};
use crate::color::ColorDepth;
use crate::components::footer::{Footer, FooterBuildConfig, RenderedFooter, Tone};
use crate::components::help_overlay::{HelpOverlay, RenderedHelpOverlay};
use crate::components::preview::{Preview, PreviewBuildConfig, RenderedPreview};
use crate::components::stat_tiles::{RenderedStatTiles, StatTiles};
use crate::components::table::{
    Cell, Column, RenderedTable, Row, ScrollableTable, TableBuildConfig, scroll_to_cursor,
};
use crate::components::text_input::{
    RenderedTextInput, TextInput, filter_suggestions, pick_suggestion,
};
use crate::config::keybindings::{
    BuiltinAction, MergedBindings, ResolvedBinding, ViewContext, execute_shell_command,
    expand_template, key_event_to_string,
};
use crate::config::types::BackendConfig;
use crate::dashboard::Dashboard;
use crate::engine::Event;
use crate::theme::ResolvedTheme;
use crate::types::{Issue, IssueId, IssueStatus, WorkerId};
use crate::util::format_timestamp;
use crate::views::{default_theme, navigate};
use crate::workflow;

// ---------------------------------------------------------------------------
// Columns and rows
// ---------------------------------------------------------------------------

const ISSUE_COLUMNS: [Column; 7] = [
    Column::new("ID", 0.0, 6),
    Column::new("Title", 4.0, 16),
    Column::new("Category", 1.5, 12),
    Column::new("Priority", 0.0, 9),
    Column::new("Status", 0.0, 16),
    Column::new("Assignee", 1.5, 12),
    Column::new("Reported", 0.0, 10).right(),
];

fn issue_to_row(issue: &Issue, in_flight: bool, theme: &ResolvedTheme, date_format: &str) -> Row {
    let status = if in_flight {
        format!("{}\u{2026}", issue.status.label())
    } else {
        issue.status.label().to_owned()
    };
    let assignee = if issue.assigned_to.is_unassigned() {
        Cell::colored(issue.assigned_to.name(), theme.text_faint)
    } else {
        Cell::plain(issue.assigned_to.name())
    };
    vec![
        Cell::colored(issue.id.to_string(), theme.text_faint),
        Cell::plain(issue.title.clone()),
        Cell::colored(issue.category.label(), theme.text_secondary),
        Cell::colored(issue.priority.label(), theme.priority_color(issue.priority)),
        Cell::colored(status, theme.status_color(issue.status)).bold(),
        assignee,
        Cell::colored(
            format_timestamp(issue.reported_time(), &issue.reported_at, date_format),
            theme.text_faint,
        ),
    ]
}

// ---------------------------------------------------------------------------
// Input modes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputMode {
    Normal,
    Search,
    /// Picking a worker for the issue.
    Assign(IssueId),
    /// Picking the next status for the issue.
    Status(IssueId),
}

/// Roster workers offered for `issue`: its department's pool, narrowed by
/// the typed text unless the user is typing a pick number.
fn worker_choices(dashboard: &Dashboard, issue: &Issue, typed: &str) -> Vec<(WorkerId, String)> {
    let all: Vec<(WorkerId, String)> = dashboard
        .roster()
        .for_department(&issue.department)
        .into_iter()
        .map(|w| {
            (
                w.id,
                format!("{} ({}, {} active)", w.name, w.department, w.active_issues),
            )
        })
        .collect();
    if typed.trim().parse::<usize>().is_ok() {
        return all;
    }
    let labels: Vec<String> = all.iter().map(|(_, l)| l.clone()).collect();
    let kept = filter_suggestions(&labels, typed.trim());
    all.into_iter().filter(|(_, l)| kept.contains(l)).collect()
}

/// Mutable UI state shared by the key handlers.
#[derive(Clone, Copy)]
struct Ui {
    cursor: State<usize>,
    scroll_offset: State<usize>,
    preview_open: State<bool>,
    input_mode: State<InputMode>,
    input_buffer: State<String>,
    pick: State<usize>,
    status: State<Option<(String, Tone)>>,
    help_visible: State<bool>,
}

impl Ui {
    fn say(mut self, text: impl Into<String>, tone: Tone) {
        self.status.set(Some((text.into(), tone)));
    }

    fn report(self, result: anyhow::Result<String>) {
        match result {
            Ok(msg) => self.say(msg, Tone::Success),
            Err(e) => self.say(format!("{e:#}"), Tone::Error),
        }
    }

    fn leave_input(mut self) {
        self.input_mode.set(InputMode::Normal);
        self.input_buffer.set(String::new());
        self.pick.set(0);
    }

    fn reset_cursor(mut self) {
        self.cursor.set(0);
        self.scroll_offset.set(0);
    }
}

/// Issue under the cursor, from the current filtered list.
fn current_issue(dashboard: Option<State<Dashboard>>, cursor: usize) -> Option<Arc<Issue>> {
    dashboard.and_then(|d| d.read().visible().get(cursor).cloned())
}

// ---------------------------------------------------------------------------
// Key handlers
// ---------------------------------------------------------------------------

fn handle_search_key(code: KeyCode, modifiers: KeyModifiers, ui: Ui, dashboard: State<Dashboard>) {
    let mut ui = ui;
    let mut dashboard = dashboard;
    match code {
        KeyCode::Esc => {
            dashboard.write().set_query("");
            ui.leave_input();
            ui.reset_cursor();
        }
        KeyCode::Enter => ui.input_mode.set(InputMode::Normal),
        KeyCode::Backspace => {
            let mut q = ui.input_buffer.read().clone();
            q.pop();
            dashboard.write().set_query(&q);
            ui.input_buffer.set(q);
            ui.reset_cursor();
        }
        KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
            let mut q = ui.input_buffer.read().clone();
            q.push(ch);
            dashboard.write().set_query(&q);
            ui.input_buffer.set(q);
            ui.reset_cursor();
        }
        _ => {}
    }
}

/// Shared editing keys of the two pick prompts. Returns `true` on Enter.
fn edit_pick_prompt(code: KeyCode, modifiers: KeyModifiers, ui: Ui, choices: usize) -> bool {
    let mut ui = ui;
    match code {
        KeyCode::Esc => {
            ui.leave_input();
            ui.say("Cancelled", Tone::Normal);
        }
        KeyCode::Enter => return true,
        KeyCode::Up => ui.pick.set(ui.pick.get().saturating_sub(1)),
        KeyCode::Down | KeyCode::Tab => {
            ui.pick.set((ui.pick.get() + 1).min(choices.saturating_sub(1)));
        }
        KeyCode::Backspace => {
            let mut buf = ui.input_buffer.read().clone();
            buf.pop();
            ui.input_buffer.set(buf);
            ui.pick.set(0);
        }
        KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
            let mut buf = ui.input_buffer.read().clone();
            buf.push(ch);
            ui.input_buffer.set(buf);
            ui.pick.set(0);
        }
        _ => {}
    }
    false
}

fn handle_assign_key(
    code: KeyCode,
    modifiers: KeyModifiers,
    ui: Ui,
    dashboard: State<Dashboard>,
    id: &IssueId,
) {
    let mut dashboard = dashboard;
    let typed = ui.input_buffer.read().clone();
    let choices = {
        let d = dashboard.read();
        match d.issue(id) {
            Some(issue) => worker_choices(&d, issue, &typed),
            None => Vec::new(),
        }
    };
    if !edit_pick_prompt(code, modifiers, ui, choices.len()) {
        return;
    }
    let Some(idx) = pick_suggestion(&typed, choices.len(), ui.pick.get()) else {
        ui.say("No such worker", Tone::Error);
        return;
    };
    let worker_id = choices[idx].0;
    ui.leave_input();
    let result = dashboard.write().assign(id, worker_id);
    match result {
        Ok(a) => ui.say(format!("Assigned issue {} to {}", a.id, a.worker_name), Tone::Success),
        Err(e) => {
            tracing::warn!("issues: assign refused: {e}");
            ui.say(e.to_string(), Tone::Error);
        }
    }
}

fn handle_status_key(
    code: KeyCode,
    modifiers: KeyModifiers,
    ui: Ui,
    dashboard: State<Dashboard>,
    bus: Option<&Bus>,
    id: &IssueId,
) {
    let mut dashboard = dashboard;
    let typed = ui.input_buffer.read().clone();
    let targets = dashboard
        .read()
        .issue(id)
        .map(|i| workflow::update_targets(i.status))
        .unwrap_or_default();
    if !edit_pick_prompt(code, modifiers, ui, targets.len()) {
        return;
    }
    let Some(idx) = pick_suggestion(&typed, targets.len(), ui.pick.get()) else {
        ui.say("No such status", Tone::Error);
        return;
    };
    let to = targets[idx];
    ui.leave_input();
    match submit_status_update(&mut *dashboard.write(), bus, id, to) {
        Ok(()) => ui.say(format!("Updating issue {id} to {to}\u{2026}"), Tone::Normal),
        Err(message) => {
            tracing::warn!("issues: status update refused: {message}");
            ui.say(message, Tone::Error);
        }
    }
}

/// Validate a status change and send it to the engine. The issue is only
/// left in flight when the request reached a running engine.
fn submit_status_update(
    dashboard: &mut Dashboard,
    bus: Option<&Bus>,
    id: &IssueId,
    to: IssueStatus,
) -> Result<(), String> {
    let Some(bus) = bus else {
        return Err("Not connected to the reports backend".to_owned());
    };
    let update = dashboard
        .begin_status_update(id, to)
        .map_err(|e| e.to_string())?;
    if bus.update_status(update) {
        return Ok(());
    }
    let description = format!("Update issue {id} to {to}");
    let message = "backend engine is not running".to_owned();
    dashboard.apply_event(Event::MutationError {
        id: id.clone(),
        description: description.clone(),
        message: message.clone(),
    });
    Err(format!("{description}: {message}"))
}

struct Signals {
    should_exit: Option<State<bool>>,
    switch_view: Option<State<bool>>,
    switch_view_back: Option<State<bool>>,
}

#[allow(clippy::too_many_lines)]
fn handle_normal_action(
    action: BuiltinAction,
    ui: Ui,
    dashboard: State<Dashboard>,
    bus: Option<&Bus>,
    backend: &BackendConfig,
    signals: &Signals,
    page: usize,
) {
    let mut ui = ui;
    let mut dashboard = dashboard;
    let issue = current_issue(Some(dashboard), ui.cursor.get());
    match action {
        BuiltinAction::Quit => {
            if let Some(mut exit) = signals.should_exit {
                exit.set(true);
            }
        }
        BuiltinAction::SwitchView => {
            if let Some(mut sv) = signals.switch_view {
                sv.set(true);
            }
        }
        BuiltinAction::SwitchViewBack => {
            if let Some(mut sv) = signals.switch_view_back {
                sv.set(true);
            }
        }
        BuiltinAction::ToggleHelp => ui.help_visible.set(!ui.help_visible.get()),
        BuiltinAction::TogglePreview => ui.preview_open.set(!ui.preview_open.get()),
        BuiltinAction::Refresh => {
            if let Some(bus) = bus {
                dashboard.write().clear_messages();
                bus.refresh(&mut *dashboard.write());
                ui.status.set(None);
            }
        }
        BuiltinAction::Search => {
            ui.input_mode.set(InputMode::Search);
            ui.input_buffer.set(dashboard.read().filter().search.clone());
            ui.status.set(None);
        }
        BuiltinAction::ClearFilters => {
            let mut d = dashboard.write();
            d.clear_filters();
            d.clear_messages();
            ui.status.set(None);
            ui.reset_cursor();
        }
        BuiltinAction::CycleStatusFilter => {
            dashboard.write().cycle_status_filter();
            ui.reset_cursor();
        }
        BuiltinAction::CyclePriorityFilter => {
            dashboard.write().cycle_priority_filter();
            ui.reset_cursor();
        }
        BuiltinAction::CycleCategoryFilter => {
            dashboard.write().cycle_category_filter();
            ui.reset_cursor();
        }
        BuiltinAction::SelectTile(tile) => {
            dashboard.write().select_tile(tile);
            ui.reset_cursor();
        }
        BuiltinAction::Assign => match issue {
            Some(issue) if workflow::accepts_assignment(issue.status) => {
                ui.input_mode.set(InputMode::Assign(issue.id.clone()));
                ui.input_buffer.set(String::new());
                ui.pick.set(0);
                ui.status.set(None);
            }
            Some(issue) => ui.say(
                format!("Issue {} is {} and can no longer be assigned", issue.id, issue.status),
                Tone::Error,
            ),
            None => {}
        },
        BuiltinAction::ChangeStatus => match issue {
            Some(issue) if dashboard.read().is_in_flight(&issue.id) => ui.say(
                format!("A status update for issue {} is already in flight", issue.id),
                Tone::Error,
            ),
            Some(issue) if workflow::update_targets(issue.status).is_empty() => ui.say(
                no_status_change_hint(issue.status),
                Tone::Normal,
            ),
            Some(issue) => {
                ui.input_mode.set(InputMode::Status(issue.id.clone()));
                ui.input_buffer.set(String::new());
                ui.pick.set(0);
                ui.status.set(None);
            }
            None => {}
        },
        BuiltinAction::CopyId => {
            if let Some(issue) = issue {
                ui.report(issue_actions::copy_id(&issue));
            }
        }
        BuiltinAction::OpenImage => {
            if let Some(issue) = issue {
                ui.report(issue_actions::open_image(&issue, backend));
            }
        }
        other => {
            let total = dashboard.read().visible().len();
            if let Some(next) = navigate(other, ui.cursor.get(), total, page) {
                ui.cursor.set(next);
                ui.scroll_offset
                    .set(scroll_to_cursor(next, ui.scroll_offset.get(), page));
            }
        }
    }
}

fn no_status_change_hint(status: IssueStatus) -> String {
    match status {
        IssueStatus::Pending => "Assign a worker to move a pending issue forward".to_owned(),
        other => format!("No status change is available from {other}"),
    }
}

// ---------------------------------------------------------------------------
// IssuesView component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct IssuesViewProps<'a> {
    pub dashboard: Option<State<Dashboard>>,
    pub bus: Option<Bus>,
    pub backend: Option<&'a BackendConfig>,
    pub theme: Option<&'a ResolvedTheme>,
    pub keybindings: Option<&'a MergedBindings>,
    pub color_depth: ColorDepth,
    pub width: u16,
    pub height: u16,
    pub preview_width_pct: f64,
    pub should_exit: Option<State<bool>>,
    pub switch_view: Option<State<bool>>,
    pub switch_view_back: Option<State<bool>>,
    /// Issue to bring under the cursor, set by the map view.
    pub focus_issue: Option<State<Option<IssueId>>>,
    pub date_format: Option<&'a str>,
    /// Whether this view is the currently active (visible) one.
    pub is_active: bool,
}

#[component]
#[allow(clippy::too_many_lines)]
pub fn IssuesView<'a>(props: &IssuesViewProps<'a>, mut hooks: Hooks) -> impl Into<AnyElement<'a>> {
    let theme = props.theme.cloned().unwrap_or_else(default_theme);
    let depth = props.color_depth;
    let is_active = props.is_active;
    let date_format = props.date_format.unwrap_or("relative");
    let preview_pct = if props.preview_width_pct > 0.0 {
        props.preview_width_pct.min(0.8)
    } else {
        0.4
    };

    let ui = Ui {
        cursor: hooks.use_state(|| 0usize),
        scroll_offset: hooks.use_state(|| 0usize),
        preview_open: hooks.use_state(|| true),
        input_mode: hooks.use_state(|| InputMode::Normal),
        input_buffer: hooks.use_state(String::new),
        pick: hooks.use_state(|| 0usize),
        status: hooks.use_state(|| Option::<(String, Tone)>::None),
        help_visible: hooks.use_state(|| false),
    };

    let dashboard = props.dashboard;
    let visible_rows = props.height.saturating_sub(9).max(1) as usize;

    // Bring a marker activated on the map under the cursor, clearing the
    // filter if it hides that issue.
    if is_active
        && let Some(mut focus) = props.focus_issue
        && let Some(mut d) = dashboard
    {
        let target = focus.read().clone();
        if let Some(id) = target {
            focus.set(None);
            let mut pos = d.read().visible().iter().position(|i| i.id == id);
            if pos.is_none() {
                d.write().clear_filters();
                pos = d.read().visible().iter().position(|i| i.id == id);
            }
            if let Some(pos) = pos {
                let mut ui = ui;
                ui.cursor.set(pos);
                ui.scroll_offset
                    .set(scroll_to_cursor(pos, ui.scroll_offset.get(), visible_rows));
                ui.preview_open.set(true);
            }
        }
    }

    // Keyboard handling.
    let keybindings = props.keybindings.cloned();
    let bus = props.bus.clone();
    let backend = props.backend.cloned().unwrap_or_default();
    let signals = Signals {
        should_exit: props.should_exit,
        switch_view: props.switch_view,
        switch_view_back: props.switch_view_back,
    };
    hooks.use_terminal_events({
        move |event| match event {
            TerminalEvent::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) if kind != KeyEventKind::Release => {
                if !is_active {
                    return;
                }
                let Some(dashboard) = dashboard else {
                    return;
                };
                let mut ui = ui;
                if ui.help_visible.get() {
                    if matches!(code, KeyCode::Char('?') | KeyCode::Esc) {
                        ui.help_visible.set(false);
                    }
                    return;
                }

                let mode = ui.input_mode.read().clone();
                match mode {
                    InputMode::Search => handle_search_key(code, modifiers, ui, dashboard),
                    InputMode::Assign(id) => {
                        handle_assign_key(code, modifiers, ui, dashboard, &id);
                    }
                    InputMode::Status(id) => {
                        handle_status_key(code, modifiers, ui, dashboard, bus.as_ref(), &id);
                    }
                    InputMode::Normal => {
                        let Some(key_str) = key_event_to_string(code, modifiers, kind) else {
                            return;
                        };
                        match keybindings
                            .as_ref()
                            .and_then(|kb| kb.resolve(&key_str, ViewContext::Issues))
                        {
                            Some(ResolvedBinding::Builtin(action)) => handle_normal_action(
                                action,
                                ui,
                                dashboard,
                                bus.as_ref(),
                                &backend,
                                &signals,
                                visible_rows,
                            ),
                            Some(ResolvedBinding::ShellCommand(cmd)) => {
                                if let Some(issue) = current_issue(Some(dashboard), ui.cursor.get())
                                {
                                    let vars = issue_actions::template_vars(&issue, &backend);
                                    let expanded = expand_template(&cmd, &vars);
                                    ui.report(execute_shell_command(&expanded).map(|out| {
                                        if out.is_empty() {
                                            format!("Ran: {expanded}")
                                        } else {
                                            out
                                        }
                                    }));
                                }
                            }
                            None => {}
                        }
                    }
                }
            }
            _ => {}
        }
    });

    // Skip heavy rendering for inactive views (all hooks above are unconditional).
    if !is_active {
        return element! {
            View(flex_direction: FlexDirection::Column)
        }
        .into_any();
    }
    let Some(dashboard) = dashboard else {
        return element! { View }.into_any();
    };
    let d = dashboard.read();

    let visible = d.visible();
    let cursor_idx = ui.cursor.get().min(visible.len().saturating_sub(1));
    let scroll = scroll_to_cursor(cursor_idx, ui.scroll_offset.get(), visible_rows);

    let is_preview_open = ui.preview_open.get() && !visible.is_empty();
    let (table_width, preview_width) = if is_preview_open {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pw = (f64::from(props.width) * preview_pct).round() as u16;
        (props.width.saturating_sub(pw), pw)
    } else {
        (props.width, 0)
    };

    let rows: Vec<Row> = visible
        .iter()
        .map(|issue| issue_to_row(issue, d.is_in_flight(&issue.id), &theme, date_format))
        .collect();
    let empty_message = if d.is_loading() && d.store().is_empty() {
        "Loading issues\u{2026}"
    } else if d.store().is_empty() {
        "No issues reported yet"
    } else {
        "No issues match the current filter"
    };
    let rendered_table = RenderedTable::build(&TableBuildConfig {
        columns: &ISSUE_COLUMNS,
        rows: &rows,
        cursor: cursor_idx,
        scroll_offset: scroll,
        visible_rows,
        total_width: table_width,
        depth,
        selected_bg: Some(theme.bg_selected),
        header_color: Some(theme.text_secondary),
        border_color: Some(theme.border_faint),
        empty_message: Some(empty_message),
    });

    let rendered_preview = if is_preview_open {
        visible.get(cursor_idx).map(|issue| {
            RenderedPreview::build(&PreviewBuildConfig {
                issue,
                in_flight: d.is_in_flight(&issue.id),
                width: preview_width,
                date_format,
                theme: &theme,
                depth,
            })
        })
    } else {
        None
    };

    let rendered_tiles = RenderedStatTiles::build(&d.stats(), d.filter(), &theme, depth);

    let mode = ui.input_mode.read().clone();
    let buffer = ui.input_buffer.read().clone();
    let rendered_input = match &mode {
        InputMode::Normal => None,
        InputMode::Search => Some(
            RenderedTextInput::build("/", &buffer, &theme, depth)
                .with_hint("status: priority: category: dept: worker: is:assigned has:location"),
        ),
        InputMode::Assign(id) => d.issue(id).map(|issue| {
            let labels: Vec<String> = worker_choices(&d, issue, &buffer)
                .into_iter()
                .map(|(_, l)| l)
                .collect();
            let selected = (!labels.is_empty()).then(|| ui.pick.get().min(labels.len() - 1));
            RenderedTextInput::build(&format!("Assign issue {id} to:"), &buffer, &theme, depth)
                .with_suggestions(&labels, selected)
        }),
        InputMode::Status(id) => d.issue(id).map(|issue| {
            let labels: Vec<String> = workflow::update_targets(issue.status)
                .iter()
                .map(|s| s.label().to_owned())
                .collect();
            let selected = (!labels.is_empty()).then(|| ui.pick.get().min(labels.len() - 1));
            RenderedTextInput::build(
                &format!("Move issue {id} from {} to:", issue.status),
                &buffer,
                &theme,
                depth,
            )
            .with_suggestions(&labels, selected)
        }),
    };

    let (context_text, tone) = if let Some((msg, tone)) = ui.status.read().clone() {
        (msg, tone)
    } else if d.is_loading() {
        ("Fetching issues\u{2026}".to_owned(), Tone::Normal)
    } else if let Some(err) = d.last_error() {
        (err.to_owned(), Tone::Error)
    } else if let Some(notice) = d.notice() {
        (notice.to_owned(), Tone::Success)
    } else {
        (
            format!("{} of {} issues", visible.len(), d.store().len()),
            Tone::Normal,
        )
    };
    let rendered_footer = RenderedFooter::build(FooterBuildConfig {
        active_view: ViewKind::Issues,
        filter_text: d.filter().describe(),
        context_text,
        tone,
        last_updated: d.last_updated(),
        theme: &theme,
        depth,
    });

    let rendered_help = if ui.help_visible.get() {
        props
            .keybindings
            .map(|kb| RenderedHelpOverlay::build(kb, ViewContext::Issues, &theme, depth))
    } else {
        None
    };

    element! {
        View(
            width: u32::from(props.width),
            height: u32::from(props.height),
            flex_direction: FlexDirection::Column,
        ) {
            StatTiles(tiles: Some(rendered_tiles))
            View(flex_grow: 1.0, flex_direction: FlexDirection::Row, overflow: Overflow::Hidden) {
                ScrollableTable(table: Some(rendered_table))
                Preview(preview: rendered_preview)
            }
            TextInput(input: rendered_input)
            Footer(footer: Some(rendered_footer))
            HelpOverlay(overlay: rendered_help, width: props.width, height: props.height)
        }
    }
    .into_any()
}
