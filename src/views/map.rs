use std::sync::{Arc, Mutex};

use iocraft::prelude::*;

use crate::actions::issue_actions;
use crate::app::{Bus, ViewKind};
use crate::color::{Color as AppColor, ColorDepth};
use crate::components::footer::{Footer, FooterBuildConfig, RenderedFooter, Tone};
use crate::components::help_overlay::{HelpOverlay, RenderedHelpOverlay};
use crate::config::keybindings::{
    BuiltinAction, MergedBindings, ResolvedBinding, ViewContext, execute_shell_command,
    expand_template, key_event_to_string,
};
use crate::config::types::BackendConfig;
use crate::dashboard::Dashboard;
use crate::map::{GridCell, GridVisualizer, MapScene, MapSession};
use crate::theme::ResolvedTheme;
use crate::types::IssueId;
use crate::views::default_theme;

type Session = MapSession<GridVisualizer>;

/// The mounted session and the grid size it was mounted at.
#[derive(Default)]
struct Mounted {
    size: (u16, u16),
    session: Option<Session>,
}

/// A stretch of same-styled grid cells, drawn as one `Text`.
#[derive(Debug, Clone, PartialEq)]
struct Run {
    text: String,
    color: Option<AppColor>,
    selected: bool,
}

fn grid_runs(row: &[GridCell]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for cell in row {
        match runs.last_mut() {
            Some(run) if run.color == cell.color && run.selected == cell.selected => {
                run.text.push(cell.ch);
            }
            _ => runs.push(Run {
                text: cell.ch.to_string(),
                color: cell.color,
                selected: cell.selected,
            }),
        }
    }
    runs
}

/// Grid area left for the map once the header, info line and footer are
/// laid out.
fn grid_size(width: u16, height: u16) -> (u16, u16) {
    (width.saturating_sub(2), height.saturating_sub(8))
}

// ---------------------------------------------------------------------------
// MapView component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct MapViewProps<'a> {
    pub dashboard: Option<State<Dashboard>>,
    pub bus: Option<Bus>,
    pub backend: Option<&'a BackendConfig>,
    pub theme: Option<&'a ResolvedTheme>,
    pub keybindings: Option<&'a MergedBindings>,
    pub color_depth: ColorDepth,
    pub width: u16,
    pub height: u16,
    /// Start with the heat layer on.
    pub heatmap: bool,
    pub should_exit: Option<State<bool>>,
    pub switch_view: Option<State<bool>>,
    pub switch_view_back: Option<State<bool>>,
    pub focus_issue: Option<State<Option<IssueId>>>,
    pub is_active: bool,
}

#[component]
#[allow(clippy::too_many_lines)]
pub fn MapView<'a>(props: &MapViewProps<'a>, mut hooks: Hooks) -> impl Into<AnyElement<'a>> {
    let theme = props.theme.cloned().unwrap_or_else(default_theme);
    let depth = props.color_depth;
    let is_active = props.is_active;
    let dashboard = props.dashboard;

    let mounted = hooks.use_state(|| Arc::new(Mutex::new(Mounted::default())));
    let initial_heatmap = props.heatmap;
    let mut heatmap = hooks.use_state(move || initial_heatmap);
    let mut status = hooks.use_state(|| Option::<(String, Tone)>::None);
    let mut help_visible = hooks.use_state(|| false);

    let keybindings = props.keybindings.cloned();
    let bus = props.bus.clone();
    let backend = props.backend.cloned().unwrap_or_default();
    let should_exit = props.should_exit;
    let switch_view = props.switch_view;
    let switch_view_back = props.switch_view_back;
    let session_handle = mounted.read().clone();
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
                let Some(mut dashboard) = dashboard else {
                    return;
                };
                if help_visible.get() {
                    if matches!(code, KeyCode::Char('?') | KeyCode::Esc) {
                        help_visible.set(false);
                    }
                    return;
                }
                let Some(key_str) = key_event_to_string(code, modifiers, kind) else {
                    return;
                };
                let Ok(mut guard) = session_handle.lock() else {
                    return;
                };
                let session = guard.session.as_mut();
                match keybindings
                    .as_ref()
                    .and_then(|kb| kb.resolve(&key_str, ViewContext::Map))
                {
                    Some(ResolvedBinding::Builtin(action)) => match action {
                        BuiltinAction::Quit => {
                            if let Some(mut exit) = should_exit {
                                exit.set(true);
                            }
                        }
                        BuiltinAction::SwitchView => {
                            if let Some(mut sv) = switch_view {
                                sv.set(true);
                            }
                        }
                        BuiltinAction::SwitchViewBack => {
                            if let Some(mut sv) = switch_view_back {
                                sv.set(true);
                            }
                        }
                        BuiltinAction::ToggleHelp => help_visible.set(true),
                        BuiltinAction::ToggleHeatmap => heatmap.set(!heatmap.get()),
                        BuiltinAction::MoveDown | BuiltinAction::PageDown => {
                            if let Some(s) = session {
                                let _ = s.select_next();
                            }
                        }
                        BuiltinAction::MoveUp | BuiltinAction::PageUp => {
                            if let Some(s) = session {
                                let _ = s.select_prev();
                            }
                        }
                        BuiltinAction::ActivateMarker => {
                            if let Some(id) = session.and_then(Session::activate) {
                                tracing::debug!("map: activated issue {id}");
                            }
                        }
                        BuiltinAction::Refresh => {
                            if let Some(bus) = &bus {
                                dashboard.write().clear_messages();
                                bus.refresh(&mut *dashboard.write());
                                status.set(None);
                            }
                        }
                        BuiltinAction::ClearFilters => {
                            dashboard.write().clear_filters();
                            status.set(None);
                        }
                        BuiltinAction::CycleStatusFilter => dashboard.write().cycle_status_filter(),
                        BuiltinAction::CyclePriorityFilter => {
                            dashboard.write().cycle_priority_filter();
                        }
                        BuiltinAction::CycleCategoryFilter => {
                            dashboard.write().cycle_category_filter();
                        }
                        BuiltinAction::Search => status.set(Some((
                            "Search from the Issues view; the map follows its filter".to_owned(),
                            Tone::Normal,
                        ))),
                        _ => {}
                    },
                    Some(ResolvedBinding::ShellCommand(cmd)) => {
                        let id = session.and_then(|s| s.selected_marker()).map(|m| m.id.clone());
                        let d = dashboard.read();
                        if let Some(issue) = id.as_ref().and_then(|id| d.issue(id)) {
                            let vars = issue_actions::template_vars(issue, &backend);
                            let expanded = expand_template(&cmd, &vars);
                            status.set(Some(match execute_shell_command(&expanded) {
                                Ok(out) if out.is_empty() => (format!("Ran: {expanded}"), Tone::Success),
                                Ok(out) => (out, Tone::Success),
                                Err(e) => (format!("{e:#}"), Tone::Error),
                            }));
                        }
                    }
                    None => {}
                }
            }
            _ => {}
        }
    });

    if !is_active {
        return element! { View }.into_any();
    }
    let Some(dashboard) = dashboard else {
        return element! { View }.into_any();
    };
    let d = dashboard.read();
    let visible = d.visible();
    let scene = MapScene::from_issues(&visible, &theme.status);
    let unlocated = scene.unlocated;
    let located = scene.markers.len();

    let (grid_w, grid_h) = grid_size(props.width, props.height);
    let handle = mounted.read().clone();
    let Ok(mut guard) = handle.lock() else {
        return element! { View }.into_any();
    };
    if guard.session.is_none() || guard.size != (grid_w, grid_h) {
        // Dropping the previous session tears its visualizer down.
        guard.session = None;
        let focus = props.focus_issue;
        guard.session = Some(
            MapSession::mount(GridVisualizer::new(grid_w, grid_h)).on_activate(move |id| {
                if let Some(mut focus) = focus {
                    focus.set(Some(id.clone()));
                }
            }),
        );
        guard.size = (grid_w, grid_h);
    }
    let Some(session) = guard.session.as_mut() else {
        return element! { View }.into_any();
    };
    if session.heatmap() != heatmap.get() {
        let _ = session.set_heatmap(heatmap.get());
    }
    let _ = session.update(scene);

    let text_fg = theme.text_primary.to_crossterm_color(depth);
    let faint_fg = theme.text_faint.to_crossterm_color(depth);
    let selected_bg = theme.bg_selected.to_crossterm_color(depth);
    let border_fg = theme.border_faint.to_crossterm_color(depth);

    let header = format!(
        "{located} on map{}{}",
        if unlocated > 0 {
            format!(" \u{b7} {unlocated} without location")
        } else {
            String::new()
        },
        if session.heatmap() { " \u{b7} heatmap" } else { "" },
    );

    let grid: Option<Vec<Vec<Run>>> = match session.last_error() {
        Some(_) => None,
        None => Some(session.visualizer().rows().iter().map(|r| grid_runs(r)).collect()),
    };
    let map_error = session.last_error().map(ToString::to_string);

    let info = match session.selected_marker() {
        Some(m) => format!(
            "#{} {} \u{b7} {} \u{b7} {:.4}, {:.4}",
            m.id,
            m.title,
            m.status.label(),
            m.lat,
            m.lng
        ),
        None if located == 0 && !d.store().is_empty() => {
            "No issue in the current filter has a location".to_owned()
        }
        None => String::new(),
    };

    let (context_text, tone) = if let Some((msg, tone)) = status.read().clone() {
        (msg, tone)
    } else if d.is_loading() {
        ("Fetching issues\u{2026}".to_owned(), Tone::Normal)
    } else if let Some(err) = d.last_error() {
        (err.to_owned(), Tone::Error)
    } else {
        ("j/k select \u{b7} enter show in list \u{b7} h heatmap".to_owned(), Tone::Normal)
    };
    let rendered_footer = RenderedFooter::build(FooterBuildConfig {
        active_view: ViewKind::Map,
        filter_text: d.filter().describe(),
        context_text,
        tone,
        last_updated: d.last_updated(),
        theme: &theme,
        depth,
    });
    let rendered_help = if help_visible.get() {
        props
            .keybindings
            .map(|kb| RenderedHelpOverlay::build(kb, ViewContext::Map, &theme, depth))
    } else {
        None
    };

    element! {
        View(
            width: u32::from(props.width),
            height: u32::from(props.height),
            flex_direction: FlexDirection::Column,
        ) {
            View(padding_left: 1) {
                Text(content: header, color: faint_fg, wrap: TextWrap::NoWrap)
            }
            View(
                flex_grow: 1.0,
                flex_direction: FlexDirection::Column,
                border_style: BorderStyle::Round,
                border_color: border_fg,
                overflow: Overflow::Hidden,
            ) {
                #(grid.map(|rows| {
                    element! {
                        View(flex_direction: FlexDirection::Column) {
                            #(rows.into_iter().enumerate().map(|(y, runs)| {
                                element! {
                                    View(key: y, height: 1) {
                                        #(runs.into_iter().enumerate().map(|(x, run)| {
                                            element! {
                                                View(
                                                    key: x,
                                                    background_color: if run.selected { selected_bg } else { Color::Reset },
                                                ) {
                                                    Text(
                                                        content: run.text,
                                                        color: run.color.map_or(text_fg, |c| c.to_crossterm_color(depth)),
                                                        weight: if run.selected { Weight::Bold } else { Weight::Normal },
                                                        wrap: TextWrap::NoWrap,
                                                    )
                                                }
                                            }
                                        }))
                                    }
                                }
                            }))
                        }
                    }
                }))
                #(map_error.map(|msg| {
                    element! {
                        View(padding: 1) {
                            Text(content: msg, color: theme.text_error.to_crossterm_color(depth))
                        }
                    }
                }))
            }
            View(padding_left: 1, height: 1) {
                Text(content: info, color: text_fg, wrap: TextWrap::NoWrap)
            }
            Footer(footer: Some(rendered_footer))
            HelpOverlay(overlay: rendered_help, width: props.width, height: props.height)
        }
    }
    .into_any()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(ch: char, color: Option<AppColor>, selected: bool) -> GridCell {
        GridCell { ch, color, selected }
    }

    #[test]
    fn runs_merge_same_style() {
        let red = AppColor::Hex { r: 255, g: 0, b: 0 };
        let row = vec![
            cell(' ', None, false),
            cell(' ', None, false),
            cell('●', Some(red), false),
            cell('●', Some(red), true),
            cell(' ', None, false),
        ];
        let runs = grid_runs(&row);
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["  ", "●", "●", " "]);
        assert!(runs[2].selected);
    }

    #[test]
    fn grid_leaves_room_for_chrome() {
        assert_eq!(grid_size(80, 24), (78, 16));
        assert_eq!(grid_size(1, 1), (0, 0));
    }
}
