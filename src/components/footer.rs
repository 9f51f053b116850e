use std::time::Instant;

use iocraft::prelude::*;

use crate::app::ViewKind;
use crate::color::ColorDepth;
use crate::theme::ResolvedTheme;

// ---------------------------------------------------------------------------
// Footer component: view indicators, context, last update
// ---------------------------------------------------------------------------

pub struct FooterView {
    pub label: &'static str,
    pub is_active: bool,
}

pub struct RenderedFooter {
    pub views: Vec<FooterView>,
    pub active_bg: Color,
    pub inactive_fg: Color,
    pub filter_text: String,
    pub context_text: String,
    pub context_fg: Color,
    pub updated_text: String,
    pub text_fg: Color,
    pub border_fg: Color,
}

/// Tone of the context message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Success,
    Error,
}

pub struct FooterBuildConfig<'a> {
    pub active_view: ViewKind,
    pub filter_text: String,
    pub context_text: String,
    pub tone: Tone,
    pub last_updated: Option<Instant>,
    pub theme: &'a ResolvedTheme,
    pub depth: ColorDepth,
}

impl RenderedFooter {
    pub fn build(cfg: FooterBuildConfig<'_>) -> Self {
        let t = cfg.theme;
        let depth = cfg.depth;
        let context_fg = match cfg.tone {
            Tone::Normal => t.text_faint,
            Tone::Success => t.text_success,
            Tone::Error => t.text_error,
        };

        Self {
            views: ViewKind::ALL
                .iter()
                .map(|v| FooterView {
                    label: v.label(),
                    is_active: *v == cfg.active_view,
                })
                .collect(),
            active_bg: t.border_primary.to_crossterm_color(depth),
            inactive_fg: t.text_faint.to_crossterm_color(depth),
            filter_text: cfg.filter_text,
            context_text: cfg.context_text,
            context_fg: context_fg.to_crossterm_color(depth),
            updated_text: format_updated_ago(cfg.last_updated),
            text_fg: t.text_faint.to_crossterm_color(depth),
            border_fg: t.border_faint.to_crossterm_color(depth),
        }
    }
}

/// Format a last-fetch instant as `"Updated ~Xs ago"`.
pub fn format_updated_ago(last_fetch: Option<Instant>) -> String {
    let Some(t) = last_fetch else {
        return String::new();
    };
    let elapsed = t.elapsed().as_secs();
    if elapsed < 60 {
        format!("Updated ~{elapsed}s ago")
    } else if elapsed < 3600 {
        format!("Updated ~{}m ago", elapsed / 60)
    } else {
        format!("Updated ~{}h ago", elapsed / 3600)
    }
}

#[derive(Default, Props)]
pub struct FooterProps {
    pub footer: Option<RenderedFooter>,
}

#[component]
pub fn Footer(props: &mut FooterProps) -> impl Into<AnyElement<'static>> {
    let Some(f) = props.footer.take() else {
        return element! { View }.into_any();
    };

    let sep = "  \u{2022}  ";
    let mut middle = Vec::new();
    for (text, fg) in [
        (&f.filter_text, f.text_fg),
        (&f.context_text, f.context_fg),
        (&f.updated_text, f.text_fg),
    ] {
        if text.is_empty() {
            continue;
        }
        if !middle.is_empty() {
            middle.push(MixedTextContent::new(sep).color(f.text_fg));
        }
        middle.push(MixedTextContent::new(text).color(fg));
    }

    element! {
        View(
            border_style: BorderStyle::Single,
            border_edges: Edges::Top,
            border_color: f.border_fg,
            padding_left: 1,
            padding_right: 1,
        ) {
            #(f.views.iter().map(|v| {
                let (fg, bg, weight) = if v.is_active {
                    (Color::White, f.active_bg, Weight::Bold)
                } else {
                    (f.inactive_fg, Color::Reset, Weight::Normal)
                };
                element! {
                    View(background_color: bg) {
                        Text(content: format!(" {} ", v.label), color: fg, weight, wrap: TextWrap::NoWrap)
                    }
                }
            }))
            Text(content: " \u{2502} ", color: f.text_fg, wrap: TextWrap::NoWrap)
            View(flex_grow: 1.0) {
                MixedText(contents: middle, wrap: TextWrap::NoWrap)
            }
            Text(content: " \u{2502} ? help", color: f.text_fg, wrap: TextWrap::NoWrap)
        }
    }
    .into_any()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updated_ago_is_blank_before_first_fetch() {
        assert_eq!(format_updated_ago(None), "");
        assert!(format_updated_ago(Some(Instant::now())).starts_with("Updated ~"));
    }

    #[test]
    fn active_view_is_marked() {
        let theme = ResolvedTheme::default();
        let f = RenderedFooter::build(FooterBuildConfig {
            active_view: ViewKind::Map,
            filter_text: String::new(),
            context_text: "3 issues".to_owned(),
            tone: Tone::Normal,
            last_updated: None,
            theme: &theme,
            depth: ColorDepth::TrueColor,
        });
        let active: Vec<_> = f.views.iter().filter(|v| v.is_active).map(|v| v.label).collect();
        assert_eq!(active, vec!["Map"]);
    }
}
