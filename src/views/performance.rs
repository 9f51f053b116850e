use iocraft::prelude::*;

use crate::app::{Bus, ViewKind};
use crate::color::ColorDepth;
use crate::components::footer::{Footer, FooterBuildConfig, RenderedFooter, Tone};
use crate::components::help_overlay::{HelpOverlay, RenderedHelpOverlay};
use crate::components::table::{
    Cell, Column, RenderedTable, Row, ScrollableTable, TableBuildConfig, scroll_to_cursor,
};
use crate::config::keybindings::{
    BuiltinAction, MergedBindings, ResolvedBinding, ViewContext, key_event_to_string,
};
use crate::dashboard::Dashboard;
use crate::performance::{DepartmentRow, PerformanceReport, TrendPoint};
use crate::theme::ResolvedTheme;
use crate::util::{format_days, format_percent};
use crate::views::{default_theme, navigate};

const DEPARTMENT_COLUMNS: [Column; 5] = [
    Column::new("Department", 3.0, 14),
    Column::new("Total", 0.0, 6).right(),
    Column::new("Resolved", 0.0, 9).right(),
    Column::new("Pending", 0.0, 8).right(),
    Column::new("Rate", 0.0, 6).right(),
];

/// Width of the longest trend bar.
const BAR_WIDTH: usize = 24;

/// The department after `current` in `departments`, wrapping through
/// "all departments" (`None`).
fn next_department(current: Option<&str>, departments: &[String]) -> Option<String> {
    match current {
        None => departments.first().cloned(),
        Some(cur) => departments
            .iter()
            .position(|d| d.eq_ignore_ascii_case(cur))
            .and_then(|i| departments.get(i + 1))
            .cloned(),
    }
}

/// A bar of `value` scaled against `max`, at least one cell for non-zero.
fn bar(value: usize, max: usize, width: usize, glyph: char) -> String {
    if value == 0 || max == 0 {
        return String::new();
    }
    let cells = (value * width).div_ceil(max).clamp(1, width);
    std::iter::repeat_n(glyph, cells).collect()
}

fn department_to_row(row: &DepartmentRow, theme: &ResolvedTheme) -> Row {
    #[allow(clippy::cast_precision_loss)]
    let rate = (row.total > 0).then(|| row.resolved as f64 / row.total as f64);
    vec![
        Cell::plain(row.department.clone()),
        Cell::plain(row.total.to_string()),
        Cell::colored(row.resolved.to_string(), theme.text_success),
        Cell::colored(
            row.pending.to_string(),
            if row.pending > 0 {
                theme.text_warning
            } else {
                theme.text_faint
            },
        ),
        Cell::colored(format_percent(rate), theme.text_secondary),
    ]
}

struct Card {
    label: &'static str,
    value: String,
    accent: Color,
}

fn metric_cards(report: &PerformanceReport, theme: &ResolvedTheme, depth: ColorDepth) -> Vec<Card> {
    let card = |label, value: String, accent: crate::color::Color| Card {
        label,
        value,
        accent: accent.to_crossterm_color(depth),
    };
    vec![
        card("Total", report.total.to_string(), theme.text_primary),
        card("Resolved", report.resolved.to_string(), theme.text_success),
        card(
            "Resolution rate",
            format_percent(report.resolution_rate),
            theme.text_success,
        ),
        card(
            "Avg. resolution",
            format_days(report.avg_resolution_days),
            theme.text_secondary,
        ),
        card("Pending", report.pending.to_string(), theme.text_warning),
        card(
            "High priority pending",
            report.high_priority_pending.to_string(),
            theme.priority_high,
        ),
    ]
}

struct TrendLine {
    month: String,
    resolved_bar: String,
    open_bar: String,
    counts: String,
}

fn trend_lines(trend: &[TrendPoint]) -> Vec<TrendLine> {
    let max = trend
        .iter()
        .map(|p| p.resolved.max(p.open))
        .max()
        .unwrap_or(0);
    trend
        .iter()
        .map(|p| TrendLine {
            month: p.month.label(),
            resolved_bar: bar(p.resolved, max, BAR_WIDTH, '\u{2588}'),
            open_bar: bar(p.open, max, BAR_WIDTH, '\u{2591}'),
            counts: format!("{} resolved / {} open", p.resolved, p.open),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// PerformanceView component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct PerformanceViewProps<'a> {
    pub dashboard: Option<State<Dashboard>>,
    pub bus: Option<Bus>,
    pub theme: Option<&'a ResolvedTheme>,
    pub keybindings: Option<&'a MergedBindings>,
    pub color_depth: ColorDepth,
    pub width: u16,
    pub height: u16,
    pub should_exit: Option<State<bool>>,
    pub switch_view: Option<State<bool>>,
    pub switch_view_back: Option<State<bool>>,
    pub is_active: bool,
}

#[component]
#[allow(clippy::too_many_lines)]
pub fn PerformanceView<'a>(
    props: &PerformanceViewProps<'a>,
    mut hooks: Hooks,
) -> impl Into<AnyElement<'a>> {
    let theme = props.theme.cloned().unwrap_or_else(default_theme);
    let depth = props.color_depth;
    let is_active = props.is_active;
    let dashboard = props.dashboard;

    let mut department = hooks.use_state(|| Option::<String>::None);
    let mut cursor = hooks.use_state(|| 0usize);
    let mut scroll_offset = hooks.use_state(|| 0usize);
    let mut help_visible = hooks.use_state(|| false);

    let keybindings = props.keybindings.cloned();
    let bus = props.bus.clone();
    let should_exit = props.should_exit;
    let switch_view = props.switch_view;
    let switch_view_back = props.switch_view_back;
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
                let Some(ResolvedBinding::Builtin(action)) = keybindings
                    .as_ref()
                    .and_then(|kb| kb.resolve(&key_str, ViewContext::Performance))
                else {
                    return;
                };
                match action {
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
                    BuiltinAction::Refresh => {
                        if let Some(bus) = &bus {
                            dashboard.write().clear_messages();
                            bus.refresh(&mut *dashboard.write());
                        }
                    }
                    BuiltinAction::CycleDepartment => {
                        let names: Vec<String> = dashboard
                            .read()
                            .performance(None)
                            .departments
                            .into_iter()
                            .map(|row| row.department)
                            .collect();
                        let next = next_department(department.read().as_deref(), &names);
                        department.set(next);
                        cursor.set(0);
                        scroll_offset.set(0);
                    }
                    BuiltinAction::ClearFilters => {
                        department.set(None);
                        cursor.set(0);
                        scroll_offset.set(0);
                    }
                    other => {
                        let total = dashboard.read().performance(None).departments.len();
                        if let Some(next) = navigate(other, cursor.get(), total, 5) {
                            cursor.set(next);
                        }
                    }
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

    let selected = department.read().clone();
    let report = d.performance(selected.as_deref());
    let all_departments = d.performance(None).departments;

    let cards = metric_cards(&report, &theme, depth);
    let trend = trend_lines(&report.trend);

    // Cards, trend and chrome take the rest; the table scrolls.
    let trend_rows = u16::try_from(trend.len()).unwrap_or(u16::MAX);
    let visible_rows = props
        .height
        .saturating_sub(12 + trend_rows)
        .max(3) as usize;
    let cursor_idx = cursor.get().min(all_departments.len().saturating_sub(1));
    let scroll = scroll_to_cursor(cursor_idx, scroll_offset.get(), visible_rows);
    let rows: Vec<Row> = all_departments
        .iter()
        .map(|r| department_to_row(r, &theme))
        .collect();
    let rendered_table = RenderedTable::build(&TableBuildConfig {
        columns: &DEPARTMENT_COLUMNS,
        rows: &rows,
        cursor: cursor_idx,
        scroll_offset: scroll,
        visible_rows,
        total_width: props.width,
        depth,
        selected_bg: Some(theme.bg_selected),
        header_color: Some(theme.text_secondary),
        border_color: Some(theme.border_faint),
        empty_message: Some("No issues to measure yet"),
    });

    let scope = selected.as_deref().unwrap_or("All departments").to_owned();
    let (context_text, tone) = if d.is_loading() {
        ("Fetching issues\u{2026}".to_owned(), Tone::Normal)
    } else if let Some(err) = d.last_error() {
        (err.to_owned(), Tone::Error)
    } else {
        (format!("d cycle department \u{b7} {scope}"), Tone::Normal)
    };
    let rendered_footer = RenderedFooter::build(FooterBuildConfig {
        active_view: ViewKind::Performance,
        filter_text: scope.clone(),
        context_text,
        tone,
        last_updated: d.last_updated(),
        theme: &theme,
        depth,
    });
    let rendered_help = if help_visible.get() {
        props
            .keybindings
            .map(|kb| RenderedHelpOverlay::build(kb, ViewContext::Performance, &theme, depth))
    } else {
        None
    };

    let label_fg = theme.text_faint.to_crossterm_color(depth);
    let text_fg = theme.text_primary.to_crossterm_color(depth);
    let border_fg = theme.border_faint.to_crossterm_color(depth);
    let resolved_fg = theme.text_success.to_crossterm_color(depth);
    let open_fg = theme.text_warning.to_crossterm_color(depth);

    element! {
        View(
            width: u32::from(props.width),
            height: u32::from(props.height),
            flex_direction: FlexDirection::Column,
        ) {
            View(padding_left: 1) {
                Text(content: scope, color: text_fg, weight: Weight::Bold, wrap: TextWrap::NoWrap)
            }
            View(flex_direction: FlexDirection::Row, flex_wrap: FlexWrap::Wrap) {
                #(cards.into_iter().enumerate().map(|(i, c)| {
                    element! {
                        View(
                            key: i,
                            flex_direction: FlexDirection::Column,
                            border_style: BorderStyle::Round,
                            border_color: border_fg,
                            padding_left: 1,
                            padding_right: 1,
                            margin_right: 1,
                        ) {
                            Text(content: c.value, color: c.accent, weight: Weight::Bold, wrap: TextWrap::NoWrap)
                            Text(content: c.label, color: label_fg, wrap: TextWrap::NoWrap)
                        }
                    }
                }))
            }
            View(flex_direction: FlexDirection::Column, padding_left: 1, margin_top: 1) {
                Text(content: "Monthly trend", color: label_fg, wrap: TextWrap::NoWrap)
                #(trend.into_iter().enumerate().map(|(i, line)| {
                    element! {
                        View(key: i, height: 1) {
                            Text(content: format!("{:<7}", line.month), color: text_fg, wrap: TextWrap::NoWrap)
                            Text(content: line.resolved_bar, color: resolved_fg, wrap: TextWrap::NoWrap)
                            Text(content: line.open_bar, color: open_fg, wrap: TextWrap::NoWrap)
                            Text(content: format!(" {}", line.counts), color: label_fg, wrap: TextWrap::NoWrap)
                        }
                    }
                }))
            }
            View(flex_grow: 1.0, margin_top: 1, overflow: Overflow::Hidden) {
                ScrollableTable(table: Some(rendered_table))
            }
            Footer(footer: Some(rendered_footer))
            HelpOverlay(overlay: rendered_help, width: props.width, height: props.height)
        }
    }
    .into_any()
}
