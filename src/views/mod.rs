pub mod issues;
pub mod map;
pub mod performance;

use crate::config::keybindings::BuiltinAction;
use crate::theme::ResolvedTheme;

/// Fallback theme when none is provided via props.
pub(crate) fn default_theme() -> ResolvedTheme {
    ResolvedTheme::default()
}

/// New cursor position for a navigation action over `total` rows, or `None`
/// when the action is not a navigation one or there is nothing to move over.
pub(crate) fn navigate(
    action: BuiltinAction,
    cursor: usize,
    total: usize,
    page: usize,
) -> Option<usize> {
    let last = total.checked_sub(1)?;
    let page = page.max(1);
    let next = match action {
        BuiltinAction::MoveDown => cursor.saturating_add(1).min(last),
        BuiltinAction::MoveUp => cursor.saturating_sub(1),
        BuiltinAction::First => 0,
        BuiltinAction::Last => last,
        BuiltinAction::PageDown => cursor.saturating_add(page).min(last),
        BuiltinAction::PageUp => cursor.saturating_sub(page),
        _ => return None,
    };
    Some(next.min(last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_clamps_to_bounds() {
        assert_eq!(navigate(BuiltinAction::MoveDown, 4, 5, 10), Some(4));
        assert_eq!(navigate(BuiltinAction::MoveUp, 0, 5, 10), Some(0));
        assert_eq!(navigate(BuiltinAction::PageDown, 1, 30, 10), Some(11));
        assert_eq!(navigate(BuiltinAction::PageUp, 3, 30, 10), Some(0));
        assert_eq!(navigate(BuiltinAction::Last, 0, 30, 10), Some(29));
    }

    #[test]
    fn navigation_needs_rows_and_a_motion() {
        assert_eq!(navigate(BuiltinAction::MoveDown, 0, 0, 10), None);
        assert_eq!(navigate(BuiltinAction::Refresh, 0, 5, 10), None);
    }
}
