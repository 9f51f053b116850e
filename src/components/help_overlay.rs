use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::config::keybindings::{BuiltinAction, Keybinding, MergedBindings, ViewContext};
use crate::theme::ResolvedTheme;

// ---------------------------------------------------------------------------
// Help overlay: the bindings active in one view
// ---------------------------------------------------------------------------

pub struct RenderedHelpOverlay {
    pub groups: Vec<HelpGroup>,
    pub title_fg: Color,
    pub key_fg: Color,
    pub desc_fg: Color,
    pub border_fg: Color,
    pub bg: Color,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpGroup {
    pub title: String,
    pub rows: Vec<HelpRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpRow {
    pub keys: String,
    pub description: String,
}

impl RenderedHelpOverlay {
    pub fn build(
        bindings: &MergedBindings,
        context: ViewContext,
        theme: &ResolvedTheme,
        depth: ColorDepth,
    ) -> Self {
        Self {
            groups: help_groups(bindings, context),
            title_fg: theme.text_primary.to_crossterm_color(depth),
            key_fg: theme.border_primary.to_crossterm_color(depth),
            desc_fg: theme.text_secondary.to_crossterm_color(depth),
            border_fg: theme.border_faint.to_crossterm_color(depth),
            bg: Color::Black,
        }
    }
}

/// Group bindings by section, folding keys that share a description into
/// one row (`j / ↓  Move down`).
pub fn help_groups(bindings: &MergedBindings, context: ViewContext) -> Vec<HelpGroup> {
    bindings
        .all_for_context(context)
        .into_iter()
        .filter_map(|(title, list)| {
            let mut rows: Vec<HelpRow> = Vec::new();
            for kb in list {
                let description = kb.name.clone().unwrap_or_else(|| describe(kb));
                let key = display_key(&kb.key);
                match rows.iter_mut().find(|r| r.description == description) {
                    Some(row) => row.keys = format!("{} / {key}", row.keys),
                    None => rows.push(HelpRow {
                        keys: key,
                        description,
                    }),
                }
            }
            (!rows.is_empty()).then(|| HelpGroup {
                title: title.to_owned(),
                rows,
            })
        })
        .collect()
}

fn display_key(key: &str) -> String {
    match key {
        "space" => "Space".to_owned(),
        "enter" => "Enter".to_owned(),
        "esc" => "Esc".to_owned(),
        "pageup" => "PgUp".to_owned(),
        "pagedown" => "PgDn".to_owned(),
        "up" => "\u{2191}".to_owned(),
        "down" => "\u{2193}".to_owned(),
        "left" => "\u{2190}".to_owned(),
        "right" => "\u{2192}".to_owned(),
        "tab" => "Tab".to_owned(),
        "backtab" => "Shift+Tab".to_owned(),
        s => match s.split_once('+') {
            Some(("ctrl", rest)) => format!("Ctrl+{rest}"),
            Some(("alt", rest)) => format!("Alt+{rest}"),
            _ => s.to_owned(),
        },
    }
}

fn describe(kb: &Keybinding) -> String {
    if let Some(action) = kb.builtin.as_deref().and_then(BuiltinAction::from_name) {
        return action.description().to_owned();
    }
    match &kb.command {
        Some(cmd) => format!("Run: {cmd}"),
        None => "(unbound)".to_owned(),
    }
}

// ---------------------------------------------------------------------------
// HelpOverlay component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct HelpOverlayProps {
    pub overlay: Option<RenderedHelpOverlay>,
    pub width: u16,
    pub height: u16,
}

#[component]
pub fn HelpOverlay(props: &mut HelpOverlayProps) -> impl Into<AnyElement<'static>> {
    let Some(overlay) = props.overlay.take() else {
        return element! { View }.into_any();
    };

    let width = u32::from(props.width);
    let height = u32::from(props.height);
    let box_width = (width * 3 / 5).max(40).min(width.saturating_sub(4));
    let box_height = (height * 4 / 5).max(10).min(height.saturating_sub(2));

    let mut lines: Vec<(String, Color, Weight)> = vec![
        ("Keybindings".to_owned(), overlay.title_fg, Weight::Bold),
        (String::new(), overlay.desc_fg, Weight::Normal),
    ];
    for group in overlay.groups {
        lines.push((format!("  {}", group.title), overlay.title_fg, Weight::Bold));
        for row in group.rows {
            lines.push((
                format!("    {:>14}  {}", row.keys, row.description),
                overlay.desc_fg,
                Weight::Normal,
            ));
        }
        lines.push((String::new(), overlay.desc_fg, Weight::Normal));
    }
    lines.push(("  Press ? to close".to_owned(), overlay.key_fg, Weight::Normal));
    lines.truncate(box_height.saturating_sub(2) as usize);

    element! {
        View(width, height, position: Position::Absolute) {
            View(
                margin_left: width.saturating_sub(box_width) / 2,
                margin_top: height.saturating_sub(box_height) / 2,
                width: box_width,
                height: box_height,
                flex_direction: FlexDirection::Column,
                border_style: BorderStyle::Double,
                border_color: overlay.border_fg,
                background_color: overlay.bg,
                padding_left: 1,
                padding_right: 1,
                overflow: Overflow::Hidden,
            ) {
                #(lines.into_iter().enumerate().map(|(i, (text, color, weight))| {
                    element! {
                        View(key: i) {
                            Text(content: text, color, weight, wrap: TextWrap::NoWrap)
                        }
                    }
                }))
            }
        }
    }
    .into_any()
}
