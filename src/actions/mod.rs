// Side effects the issues view triggers outside the dashboard: clipboard,
// browser, and the variables handed to shell-command keybindings.

pub mod clipboard;
pub mod issue_actions;
