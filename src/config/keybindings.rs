use std::collections::HashSet;

use anyhow::{Context as _, Result};
use iocraft::prelude::{KeyCode, KeyEventKind, KeyModifiers};
use serde::Deserialize;

use crate::filter::StatTile;

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// A single key binding: maps a key chord to either a built-in action or a
/// shell command template.
#[derive(Debug, Clone, Deserialize)]
pub struct Keybinding {
    pub key: String,
    pub builtin: Option<String>,
    pub command: Option<String>,
    pub name: Option<String>,
}

/// Keybinding overrides from the `[keybindings]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeybindingsConfig {
    pub universal: Vec<Keybinding>,
    pub issues: Vec<Keybinding>,
    pub map: Vec<Keybinding>,
    pub performance: Vec<Keybinding>,
}

/// View-independent action identifier used for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinAction {
    // Universal
    MoveDown,
    MoveUp,
    First,
    Last,
    PageDown,
    PageUp,
    TogglePreview,
    Refresh,
    Search,
    ClearFilters,
    CopyId,
    OpenImage,
    ToggleHelp,
    Quit,
    SwitchView,
    SwitchViewBack,
    // Issues
    Assign,
    ChangeStatus,
    CycleStatusFilter,
    CyclePriorityFilter,
    CycleCategoryFilter,
    SelectTile(StatTile),
    // Map
    ToggleHeatmap,
    ActivateMarker,
    // Performance
    CycleDepartment,
}

impl BuiltinAction {
    /// Parse a builtin action name from the config string.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "move_down" => Self::MoveDown,
            "move_up" => Self::MoveUp,
            "first" => Self::First,
            "last" => Self::Last,
            "page_down" => Self::PageDown,
            "page_up" => Self::PageUp,
            "toggle_preview" => Self::TogglePreview,
            "refresh" => Self::Refresh,
            "search" => Self::Search,
            "clear_filters" => Self::ClearFilters,
            "copy_id" => Self::CopyId,
            "open_image" => Self::OpenImage,
            "toggle_help" => Self::ToggleHelp,
            "quit" => Self::Quit,
            "switch_view" => Self::SwitchView,
            "switch_view_back" => Self::SwitchViewBack,
            "assign" => Self::Assign,
            "change_status" => Self::ChangeStatus,
            "cycle_status" => Self::CycleStatusFilter,
            "cycle_priority" => Self::CyclePriorityFilter,
            "cycle_category" => Self::CycleCategoryFilter,
            "tile_total" => Self::SelectTile(StatTile::Total),
            "tile_pending" => Self::SelectTile(StatTile::Pending),
            "tile_active" => Self::SelectTile(StatTile::Active),
            "tile_awaiting" => Self::SelectTile(StatTile::AwaitingVerification),
            "tile_verified" => Self::SelectTile(StatTile::Verified),
            "tile_high_priority" => Self::SelectTile(StatTile::HighPriority),
            "toggle_heatmap" => Self::ToggleHeatmap,
            "activate_marker" => Self::ActivateMarker,
            "cycle_department" => Self::CycleDepartment,
            _ => return None,
        })
    }

    /// Human-readable description of this action (for help overlay).
    pub fn description(self) -> &'static str {
        match self {
            Self::MoveDown => "Move cursor down",
            Self::MoveUp => "Move cursor up",
            Self::First => "Jump to first item",
            Self::Last => "Jump to last item",
            Self::PageDown => "Page down",
            Self::PageUp => "Page up",
            Self::TogglePreview => "Toggle preview pane",
            Self::Refresh => "Reload issues from the backend",
            Self::Search => "Search / query",
            Self::ClearFilters => "Clear all filters",
            Self::CopyId => "Copy issue id",
            Self::OpenImage => "Open issue photo",
            Self::ToggleHelp => "Toggle help overlay",
            Self::Quit => "Quit",
            Self::SwitchView => "Next view",
            Self::SwitchViewBack => "Previous view",
            Self::Assign => "Assign a worker",
            Self::ChangeStatus => "Change status",
            Self::CycleStatusFilter => "Cycle status filter",
            Self::CyclePriorityFilter => "Cycle priority filter",
            Self::CycleCategoryFilter => "Cycle category filter",
            Self::SelectTile(_) => "Filter by stat tile",
            Self::ToggleHeatmap => "Toggle heatmap layer",
            Self::ActivateMarker => "Show marker in issue list",
            Self::CycleDepartment => "Cycle department",
        }
    }
}

/// Resolved binding: what to do when a key is pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedBinding {
    Builtin(BuiltinAction),
    ShellCommand(String),
}

// ---------------------------------------------------------------------------
// Key string conversion
// ---------------------------------------------------------------------------

/// Convert a crossterm key event to the canonical key string used in config
/// files, e.g. `"j"`, `"G"`, `"ctrl+c"`, `"enter"`, `"pagedown"`.
pub fn key_event_to_string(
    code: KeyCode,
    modifiers: KeyModifiers,
    kind: KeyEventKind,
) -> Option<String> {
    if kind == KeyEventKind::Release {
        return None;
    }

    let base = match code {
        KeyCode::Char(' ') => "space".to_owned(),
        KeyCode::Char(c) if modifiers.contains(KeyModifiers::CONTROL) => {
            c.to_ascii_lowercase().to_string()
        }
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "enter".to_owned(),
        KeyCode::Esc => "esc".to_owned(),
        KeyCode::Backspace => "backspace".to_owned(),
        KeyCode::Tab => "tab".to_owned(),
        KeyCode::BackTab => "backtab".to_owned(),
        KeyCode::Delete => "delete".to_owned(),
        KeyCode::Up => "up".to_owned(),
        KeyCode::Down => "down".to_owned(),
        KeyCode::Left => "left".to_owned(),
        KeyCode::Right => "right".to_owned(),
        KeyCode::PageUp => "pageup".to_owned(),
        KeyCode::PageDown => "pagedown".to_owned(),
        KeyCode::Home => "home".to_owned(),
        KeyCode::End => "end".to_owned(),
        KeyCode::F(n) => format!("f{n}"),
        _ => return None,
    };

    // Shift is encoded in the char itself ('G' vs 'g').
    let mut prefix = String::new();
    if modifiers.contains(KeyModifiers::CONTROL) {
        prefix.push_str("ctrl+");
    }
    if modifiers.contains(KeyModifiers::ALT) {
        prefix.push_str("alt+");
    }

    Some(format!("{prefix}{base}"))
}

// ---------------------------------------------------------------------------
// Default keybindings
// ---------------------------------------------------------------------------

fn kb(key: &str, builtin: &str, name: &str) -> Keybinding {
    Keybinding {
        key: key.to_owned(),
        builtin: Some(builtin.to_owned()),
        command: None,
        name: Some(name.to_owned()),
    }
}

/// Default universal keybindings (all views).
pub fn default_universal() -> Vec<Keybinding> {
    vec![
        kb("j", "move_down", "Move cursor down"),
        kb("down", "move_down", "Move cursor down"),
        kb("k", "move_up", "Move cursor up"),
        kb("up", "move_up", "Move cursor up"),
        kb("g", "first", "Jump to first item"),
        kb("home", "first", "Jump to first item"),
        kb("G", "last", "Jump to last item"),
        kb("end", "last", "Jump to last item"),
        kb("ctrl+d", "page_down", "Page down"),
        kb("pagedown", "page_down", "Page down"),
        kb("ctrl+u", "page_up", "Page up"),
        kb("pageup", "page_up", "Page up"),
        kb("r", "refresh", "Reload issues"),
        kb("/", "search", "Search / query"),
        kb("esc", "clear_filters", "Clear filters"),
        kb("tab", "switch_view", "Next view"),
        kb("backtab", "switch_view_back", "Previous view"),
        kb("?", "toggle_help", "Toggle help"),
        kb("q", "quit", "Quit"),
        kb("ctrl+c", "quit", "Quit"),
    ]
}

/// Default Issues view keybindings.
pub fn default_issues() -> Vec<Keybinding> {
    vec![
        kb("p", "toggle_preview", "Toggle preview pane"),
        kb("a", "assign", "Assign a worker"),
        kb("s", "change_status", "Change status"),
        kb("S", "cycle_status", "Cycle status filter"),
        kb("P", "cycle_priority", "Cycle priority filter"),
        kb("C", "cycle_category", "Cycle category filter"),
        kb("1", "tile_total", "Show all issues"),
        kb("2", "tile_pending", "Pending issues"),
        kb("3", "tile_active", "Active issues"),
        kb("4", "tile_awaiting", "Awaiting verification"),
        kb("5", "tile_verified", "Verified issues"),
        kb("6", "tile_high_priority", "High-priority issues"),
        kb("y", "copy_id", "Copy issue id"),
        kb("o", "open_image", "Open issue photo"),
    ]
}

/// Default Map view keybindings.
pub fn default_map() -> Vec<Keybinding> {
    vec![
        kb("h", "toggle_heatmap", "Toggle heatmap"),
        kb("enter", "activate_marker", "Show in issue list"),
        kb("S", "cycle_status", "Cycle status filter"),
        kb("P", "cycle_priority", "Cycle priority filter"),
        kb("C", "cycle_category", "Cycle category filter"),
    ]
}

/// Default Performance view keybindings.
pub fn default_performance() -> Vec<Keybinding> {
    vec![kb("d", "cycle_department", "Cycle department")]
}

// ---------------------------------------------------------------------------
// Merged keybinding set
// ---------------------------------------------------------------------------

/// View context for keybinding resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewContext {
    Issues,
    Map,
    Performance,
}

/// Defaults merged with user overrides. User bindings replace defaults for
/// the same key.
#[derive(Debug, Clone)]
pub struct MergedBindings {
    pub universal: Vec<Keybinding>,
    pub issues: Vec<Keybinding>,
    pub map: Vec<Keybinding>,
    pub performance: Vec<Keybinding>,
}

impl MergedBindings {
    pub fn from_config(config: &KeybindingsConfig) -> Self {
        Self {
            universal: merge_lists(&default_universal(), &config.universal),
            issues: merge_lists(&default_issues(), &config.issues),
            map: merge_lists(&default_map(), &config.map),
            performance: merge_lists(&default_performance(), &config.performance),
        }
    }

    fn context(&self, context: ViewContext) -> &[Keybinding] {
        match context {
            ViewContext::Issues => &self.issues,
            ViewContext::Map => &self.map,
            ViewContext::Performance => &self.performance,
        }
    }

    /// Look up a key string, checking context-specific bindings first, then
    /// universal.
    pub fn resolve(&self, key: &str, context: ViewContext) -> Option<ResolvedBinding> {
        find_binding(self.context(context), key).or_else(|| find_binding(&self.universal, key))
    }

    /// `(label, bindings)` groups for the help overlay, universal first.
    pub fn all_for_context(&self, context: ViewContext) -> Vec<(&'static str, &[Keybinding])> {
        let label = match context {
            ViewContext::Issues => "Issues",
            ViewContext::Map => "Map",
            ViewContext::Performance => "Performance",
        };
        vec![
            ("Universal", self.universal.as_slice()),
            (label, self.context(context)),
        ]
    }
}

fn merge_lists(defaults: &[Keybinding], overrides: &[Keybinding]) -> Vec<Keybinding> {
    let override_keys: HashSet<&str> = overrides.iter().map(|b| b.key.as_str()).collect();
    defaults
        .iter()
        .filter(|b| !override_keys.contains(b.key.as_str()))
        .chain(overrides)
        .cloned()
        .collect()
}

fn find_binding(bindings: &[Keybinding], key: &str) -> Option<ResolvedBinding> {
    bindings.iter().filter(|b| b.key == key).find_map(|b| {
        if let Some(action) = b.builtin.as_deref().and_then(BuiltinAction::from_name) {
            return Some(ResolvedBinding::Builtin(action));
        }
        b.command.clone().map(ResolvedBinding::ShellCommand)
    })
}

// ---------------------------------------------------------------------------
// Template variable expansion
// ---------------------------------------------------------------------------

/// Variables available to shell-command keybindings.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    pub id: String,
    pub title: String,
    pub status: String,
    pub department: String,
    pub assignee: String,
    pub api_url: String,
    pub citizen_url: String,
}

/// Expand `{{.Var}}` placeholders in a command string.
pub fn expand_template(template: &str, vars: &TemplateVars) -> String {
    template
        .replace("{{.Id}}", &vars.id)
        .replace("{{.Title}}", &vars.title)
        .replace("{{.Status}}", &vars.status)
        .replace("{{.Department}}", &vars.department)
        .replace("{{.Assignee}}", &vars.assignee)
        .replace("{{.ApiUrl}}", &vars.api_url)
        .replace("{{.CitizenUrl}}", &vars.citizen_url)
}

// ---------------------------------------------------------------------------
// Shell command execution
// ---------------------------------------------------------------------------

/// Run a shell command and return its trimmed stdout.
pub fn execute_shell_command(command: &str) -> Result<String> {
    let output = std::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .context("spawning shell command")?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    } else {
        anyhow::bail!(
            "command failed (exit {}): {}",
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        )
    }
}
