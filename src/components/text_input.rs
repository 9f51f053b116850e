use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::theme::ResolvedTheme;

// ---------------------------------------------------------------------------
// Pre-rendered prompt line
// ---------------------------------------------------------------------------

pub struct RenderedTextInput {
    pub prompt: String,
    pub text: String,
    pub text_fg: Color,
    pub prompt_fg: Color,
    pub hint_fg: Color,
    pub border_fg: Color,
    pub suggestions: Vec<RenderedSuggestion>,
    pub hint: Option<String>,
}

pub struct RenderedSuggestion {
    pub text: String,
    pub is_selected: bool,
}

impl RenderedTextInput {
    /// A bare prompt with a block cursor after the typed text.
    pub fn build(prompt: &str, text: &str, theme: &ResolvedTheme, depth: ColorDepth) -> Self {
        Self {
            prompt: prompt.to_owned(),
            text: format!("{text}\u{2588}"),
            text_fg: theme.text_primary.to_crossterm_color(depth),
            prompt_fg: theme.border_primary.to_crossterm_color(depth),
            hint_fg: theme.text_faint.to_crossterm_color(depth),
            border_fg: theme.border_faint.to_crossterm_color(depth),
            suggestions: Vec::new(),
            hint: None,
        }
    }

    /// Attach a numbered pick list under the prompt.
    #[must_use]
    pub fn with_suggestions(mut self, suggestions: &[String], selected: Option<usize>) -> Self {
        self.suggestions = suggestions
            .iter()
            .enumerate()
            .map(|(i, s)| RenderedSuggestion {
                text: format!("{}. {s}", i + 1),
                is_selected: selected == Some(i),
            })
            .collect();
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Pick-list helpers
// ---------------------------------------------------------------------------

/// Case-insensitive substring filter over candidate labels.
pub(crate) fn filter_suggestions(candidates: &[String], query: &str) -> Vec<String> {
    if query.is_empty() {
        return candidates.to_vec();
    }
    let lower = query.to_lowercase();
    candidates
        .iter()
        .filter(|c| c.to_lowercase().contains(&lower))
        .cloned()
        .collect()
}

/// Resolve what the user typed against a pick list: a 1-based number picks
/// by position, otherwise the highlighted entry wins.
pub(crate) fn pick_suggestion(typed: &str, count: usize, selected: usize) -> Option<usize> {
    if let Ok(n) = typed.trim().parse::<usize>() {
        return (1..=count).contains(&n).then(|| n - 1);
    }
    (selected < count).then_some(selected)
}

// ---------------------------------------------------------------------------
// TextInput component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct TextInputProps {
    pub input: Option<RenderedTextInput>,
}

#[component]
pub fn TextInput(props: &mut TextInputProps) -> impl Into<AnyElement<'static>> {
    let Some(input) = props.input.take() else {
        return element! { View }.into_any();
    };

    let text_fg = input.text_fg;
    let prompt_fg = input.prompt_fg;
    let lines: Vec<(String, Color)> = input
        .suggestions
        .into_iter()
        .map(|s| {
            if s.is_selected {
                (format!("> {}", s.text), prompt_fg)
            } else {
                (format!("  {}", s.text), text_fg)
            }
        })
        .chain(input.hint.map(|h| (h, input.hint_fg)))
        .collect();

    element! {
        View(
            flex_direction: FlexDirection::Column,
            border_style: BorderStyle::Single,
            border_edges: Edges::Top,
            border_color: input.border_fg,
            padding_left: 1,
            padding_right: 1,
        ) {
            View(flex_direction: FlexDirection::Row) {
                Text(content: input.prompt, color: prompt_fg, wrap: TextWrap::NoWrap)
                Text(content: " ", color: text_fg)
                Text(content: input.text, color: text_fg, wrap: TextWrap::NoWrap)
            }
            #(lines.into_iter().enumerate().map(|(i, (text, fg))| {
                element! {
                    View(key: i) {
                        Text(content: text, color: fg, wrap: TextWrap::NoWrap)
                    }
                }
            }))
        }
    }
    .into_any()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec![
            "Rajesh Kumar".to_owned(),
            "Vikram Singh".to_owned(),
            "Priya Sharma".to_owned(),
        ]
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        assert_eq!(filter_suggestions(&names(), "").len(), 3);
        assert_eq!(filter_suggestions(&names(), "SH"), vec!["Rajesh Kumar", "Priya Sharma"]);
        assert!(filter_suggestions(&names(), "xyz").is_empty());
    }

    #[test]
    fn pick_by_number_or_highlight() {
        assert_eq!(pick_suggestion("2", 3, 0), Some(1));
        assert_eq!(pick_suggestion("4", 3, 0), None);
        assert_eq!(pick_suggestion("0", 3, 0), None);
        assert_eq!(pick_suggestion("", 3, 2), Some(2));
        assert_eq!(pick_suggestion("", 0, 0), None);
    }

    #[test]
    fn suggestions_are_numbered() {
        let input = RenderedTextInput::build(
            "Assign to:",
            "",
            &ResolvedTheme::default(),
            ColorDepth::TrueColor,
        )
        .with_suggestions(&names(), Some(1));
        assert_eq!(input.suggestions[0].text, "1. Rajesh Kumar");
        assert!(input.suggestions[1].is_selected);
        assert!(input.text.ends_with('\u{2588}'));
    }
}
