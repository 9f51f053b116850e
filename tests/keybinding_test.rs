use civic_board::config::keybindings::{
    BuiltinAction, Keybinding, KeybindingsConfig, MergedBindings, ResolvedBinding, TemplateVars,
    ViewContext, default_issues, default_universal, execute_shell_command, expand_template,
    key_event_to_string,
};
use civic_board::filter::StatTile;

use iocraft::prelude::{KeyCode, KeyEventKind, KeyModifiers};

fn binding(key: &str, builtin: Option<&str>, command: Option<&str>) -> Keybinding {
    Keybinding {
        key: key.to_owned(),
        builtin: builtin.map(str::to_owned),
        command: command.map(str::to_owned),
        name: None,
    }
}

// ---------------------------------------------------------------------------
// Rebinding
// ---------------------------------------------------------------------------

#[test]
fn override_replaces_default() {
    // "a" assigns by default; rebind it to copy the id instead.
    let config = KeybindingsConfig {
        issues: vec![binding("a", Some("copy_id"), None)],
        ..Default::default()
    };
    let merged = MergedBindings::from_config(&config);
    assert_eq!(
        merged.resolve("a", ViewContext::Issues),
        Some(ResolvedBinding::Builtin(BuiltinAction::CopyId))
    );
}

#[test]
fn moving_an_action_keeps_the_old_key() {
    let config = KeybindingsConfig {
        issues: vec![binding("A", Some("assign"), None)],
        ..Default::default()
    };
    let merged = MergedBindings::from_config(&config);
    assert_eq!(
        merged.resolve("A", ViewContext::Issues),
        Some(ResolvedBinding::Builtin(BuiltinAction::Assign))
    );
    assert_eq!(
        merged.resolve("a", ViewContext::Issues),
        Some(ResolvedBinding::Builtin(BuiltinAction::Assign))
    );
}

#[test]
fn custom_shell_command_binding() {
    let config = KeybindingsConfig {
        map: vec![binding("x", None, Some("echo {{.Id}}"))],
        ..Default::default()
    };
    let merged = MergedBindings::from_config(&config);
    match merged.resolve("x", ViewContext::Map) {
        Some(ResolvedBinding::ShellCommand(cmd)) => assert_eq!(cmd, "echo {{.Id}}"),
        other => panic!("expected ShellCommand, got {other:?}"),
    }
}

#[test]
fn context_priority_over_universal() {
    let config = KeybindingsConfig {
        universal: vec![binding("z", Some("quit"), None)],
        performance: vec![binding("z", Some("cycle_department"), None)],
        ..Default::default()
    };
    let merged = MergedBindings::from_config(&config);
    assert_eq!(
        merged.resolve("z", ViewContext::Performance),
        Some(ResolvedBinding::Builtin(BuiltinAction::CycleDepartment))
    );
    assert_eq!(
        merged.resolve("z", ViewContext::Issues),
        Some(ResolvedBinding::Builtin(BuiltinAction::Quit))
    );
}

#[test]
fn universal_fallback() {
    let merged = MergedBindings::from_config(&KeybindingsConfig::default());
    for ctx in [ViewContext::Issues, ViewContext::Map, ViewContext::Performance] {
        assert_eq!(
            merged.resolve("q", ctx),
            Some(ResolvedBinding::Builtin(BuiltinAction::Quit))
        );
    }
}

#[test]
fn unknown_key_returns_none() {
    let merged = MergedBindings::from_config(&KeybindingsConfig::default());
    assert!(merged.resolve("zzz", ViewContext::Issues).is_none());
}

#[test]
fn unknown_builtin_name_does_not_resolve() {
    let config = KeybindingsConfig {
        issues: vec![binding("w", Some("approve"), None)],
        ..Default::default()
    };
    let merged = MergedBindings::from_config(&config);
    assert!(merged.resolve("w", ViewContext::Issues).is_none());
}

#[test]
fn every_default_builtin_name_parses() {
    for kb in default_universal().iter().chain(default_issues().iter()) {
        let name = kb.builtin.as_deref().unwrap();
        assert!(
            BuiltinAction::from_name(name).is_some(),
            "default binding {} names unknown action {name}",
            kb.key
        );
    }
}

#[test]
fn tiles_are_numbered_in_display_order() {
    let merged = MergedBindings::from_config(&KeybindingsConfig::default());
    let tiles: Vec<_> = ["1", "2", "3", "4", "5", "6"]
        .iter()
        .map(|k| merged.resolve(k, ViewContext::Issues))
        .collect();
    assert_eq!(
        tiles,
        StatTile::ALL
            .iter()
            .map(|t| Some(ResolvedBinding::Builtin(BuiltinAction::SelectTile(*t))))
            .collect::<Vec<_>>()
    );
}

#[test]
fn help_groups_start_with_universal() {
    let merged = MergedBindings::from_config(&KeybindingsConfig::default());
    let groups = merged.all_for_context(ViewContext::Map);
    assert_eq!(groups[0].0, "Universal");
    assert_eq!(groups[1].0, "Map");
    assert!(groups[1].1.iter().any(|b| b.key == "h"));
}

// ---------------------------------------------------------------------------
// Key strings
// ---------------------------------------------------------------------------

#[test]
fn key_strings() {
    let press = KeyEventKind::Press;
    let none = KeyModifiers::empty();
    assert_eq!(
        key_event_to_string(KeyCode::Char('G'), KeyModifiers::SHIFT, press).as_deref(),
        Some("G")
    );
    assert_eq!(
        key_event_to_string(KeyCode::Enter, none, press).as_deref(),
        Some("enter")
    );
    assert_eq!(
        key_event_to_string(KeyCode::PageDown, none, press).as_deref(),
        Some("pagedown")
    );
    assert_eq!(
        key_event_to_string(KeyCode::Char('c'), KeyModifiers::CONTROL, press).as_deref(),
        Some("ctrl+c")
    );
}

// ---------------------------------------------------------------------------
// Templates and shell commands
// ---------------------------------------------------------------------------

#[test]
fn expand_all_template_vars() {
    let vars = TemplateVars {
        id: "101".to_owned(),
        title: "Pothole".to_owned(),
        status: "Pending".to_owned(),
        department: "Public Works".to_owned(),
        assignee: "Unassigned".to_owned(),
        api_url: "http://localhost:3001".to_owned(),
        citizen_url: "https://citizen.example.gov".to_owned(),
    };
    let result = expand_template(
        "notify --dept '{{.Department}}' --to '{{.Assignee}}' {{.CitizenUrl}}/r/{{.Id}} [{{.Status}}] {{.Title}} via {{.ApiUrl}}",
        &vars,
    );
    assert_eq!(
        result,
        "notify --dept 'Public Works' --to 'Unassigned' https://citizen.example.gov/r/101 [Pending] Pothole via http://localhost:3001"
    );
}

#[test]
fn expand_template_leaves_unknown_placeholders() {
    let vars = TemplateVars::default();
    assert_eq!(expand_template("echo {{.Number}}", &vars), "echo {{.Number}}");
}

#[test]
fn shell_command_output_is_trimmed() {
    assert_eq!(execute_shell_command("echo '  hi  '").unwrap(), "hi");
}

#[test]
fn failing_shell_command_reports_exit_code() {
    let err = execute_shell_command("exit 3").unwrap_err();
    assert!(err.to_string().contains("exit 3"));
}
