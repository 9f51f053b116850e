use crate::color::Color;
use crate::config::types::Theme;
use crate::map::StatusPalette;
use crate::types::{IssueStatus, Priority};

/// Detected terminal background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Dark,
    Light,
}

impl Background {
    /// Detect whether the terminal has a dark or light background.
    ///
    /// Heuristic: check `COLORFGBG` (format "fg;bg"), fall back to dark.
    pub fn detect() -> Self {
        std::env::var("COLORFGBG")
            .ok()
            .and_then(|v| Self::from_colorfgbg(&v))
            .unwrap_or(Background::Dark)
    }

    fn from_colorfgbg(value: &str) -> Option<Self> {
        let n: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
        // Palette slots 0-6 and 8 are the dark ones.
        Some(if n > 6 && n != 8 {
            Background::Light
        } else {
            Background::Dark
        })
    }
}

/// Every color slot the UI paints with, resolved against the user's theme
/// and the detected background.
#[derive(Debug, Clone)]
pub struct ResolvedTheme {
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_faint: Color,
    pub text_warning: Color,
    pub text_success: Color,
    pub text_error: Color,
    pub bg_selected: Color,
    pub border_primary: Color,
    pub border_faint: Color,
    pub status: StatusPalette,
    pub priority_high: Color,
    pub priority_medium: Color,
    pub priority_low: Color,
}

impl Default for ResolvedTheme {
    fn default() -> Self {
        Self::resolve(&Theme::default(), Background::Dark)
    }
}

impl ResolvedTheme {
    pub fn resolve(theme: &Theme, bg: Background) -> Self {
        let d = Defaults::for_background(bg);
        let c = &theme.colors;

        Self {
            text_primary: c.text.primary.unwrap_or(d.text_primary),
            text_secondary: c.text.secondary.unwrap_or(d.text_secondary),
            text_faint: c.text.faint.unwrap_or(d.text_faint),
            text_warning: c.text.warning.unwrap_or(d.text_warning),
            text_success: c.text.success.unwrap_or(d.text_success),
            text_error: c.text.error.unwrap_or(d.text_error),
            bg_selected: c.background.selected.unwrap_or(d.bg_selected),
            border_primary: c.border.primary.unwrap_or(d.border_primary),
            border_faint: c.border.faint.unwrap_or(d.border_faint),
            status: c.status.palette(),
            priority_high: c.priority.high.unwrap_or(d.text_error),
            priority_medium: c.priority.medium.unwrap_or(d.text_warning),
            priority_low: c.priority.low.unwrap_or(d.text_faint),
        }
    }

    pub fn status_color(&self, status: IssueStatus) -> Color {
        self.status.color(status)
    }

    pub fn priority_color(&self, priority: Priority) -> Color {
        match priority {
            Priority::High => self.priority_high,
            Priority::Medium => self.priority_medium,
            Priority::Low => self.priority_low,
        }
    }
}

struct Defaults {
    text_primary: Color,
    text_secondary: Color,
    text_faint: Color,
    text_warning: Color,
    text_success: Color,
    text_error: Color,
    bg_selected: Color,
    border_primary: Color,
    border_faint: Color,
}

impl Defaults {
    fn for_background(bg: Background) -> Self {
        match bg {
            Background::Dark => Self {
                text_primary: Color::Ansi256(7),
                text_secondary: Color::Ansi256(245),
                text_faint: Color::Ansi256(243),
                text_warning: Color::Ansi256(11),
                text_success: Color::Ansi256(10),
                text_error: Color::Ansi256(9),
                bg_selected: Color::Ansi256(237),
                border_primary: Color::Ansi256(244),
                border_faint: Color::Ansi256(241),
            },
            Background::Light => Self {
                text_primary: Color::Ansi256(0),
                text_secondary: Color::Ansi256(240),
                text_faint: Color::Ansi256(248),
                text_warning: Color::Ansi256(3),
                text_success: Color::Ansi256(2),
                text_error: Color::Ansi256(1),
                bg_selected: Color::Ansi256(254),
                border_primary: Color::Ansi256(240),
                border_faint: Color::Ansi256(252),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorfgbg_parsing() {
        assert_eq!(Background::from_colorfgbg("15;0"), Some(Background::Dark));
        assert_eq!(Background::from_colorfgbg("0;15"), Some(Background::Light));
        assert_eq!(Background::from_colorfgbg("0;default"), None);
    }
}
