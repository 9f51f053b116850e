use std::path::Path;

use civic_board::color::Color;
use civic_board::config::loader::load_config;
use civic_board::config::types::{AppConfig, View};

#[test]
fn parse_minimal_config() {
    let toml = r#"
[backend]
base_url = "https://reports.example.gov"
"#;
    let config: AppConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.backend.base_url, "https://reports.example.gov");
    assert_eq!(config.backend.timeout_secs, 30);
    assert_eq!(config.defaults.view, View::Issues);
}

#[test]
fn default_config_has_sane_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.backend.base_url, "http://localhost:3001");
    assert_eq!(config.defaults.refetch_interval_minutes, 5);
    assert!((config.defaults.preview.width - 0.4).abs() < f64::EPSILON);
    assert_eq!(config.defaults.date_format, "relative");
    assert!(!config.defaults.heatmap);
}

#[test]
fn empty_worker_list_means_builtin_roster() {
    let config = AppConfig::default();
    let roster = config.roster();
    assert!(!roster.is_empty());
    assert!(roster.find_by_name("Rajesh Kumar").is_some());
}

#[test]
fn parse_workers() {
    let toml = r#"
[[workers]]
id = 21
name = "Farah Khan"
department = "Horticulture"
"#;
    let config: AppConfig = toml::from_str(toml).unwrap();
    let roster = config.roster();
    assert_eq!(roster.workers().len(), 1);
    let worker = roster.find(21).unwrap();
    assert_eq!(worker.department, "Horticulture");
    assert_eq!(worker.active_issues, 0);
}

#[test]
fn parse_status_colors() {
    let toml = r##"
[theme.colors.status]
pending = "#eab308"
rejected = "red"
"##;
    let config: AppConfig = toml::from_str(toml).unwrap();
    let palette = config.theme.colors.status.palette();
    assert_eq!(
        palette.pending,
        Color::Hex {
            r: 0xea,
            g: 0xb3,
            b: 0x08
        }
    );
    assert_eq!(palette.rejected, Color::Ansi256(1));
}

#[test]
fn parse_invalid_color_fails() {
    let toml = r#"
[theme.colors.text]
primary = "not-a-color"
"#;
    let result: Result<AppConfig, _> = toml::from_str(toml);
    assert!(result.is_err());
}

#[test]
fn parse_keybindings() {
    let toml = r#"
[[keybindings.issues]]
key = "ctrl+o"
command = "xdg-open {{.CitizenUrl}}/reports/{{.Id}}"
name = "Open in citizen app"
"#;
    let config: AppConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.keybindings.issues.len(), 1);
    assert_eq!(config.keybindings.issues[0].key, "ctrl+o");
}

#[test]
fn parse_default_view() {
    let toml = r#"
[defaults]
view = "performance"
date_format = "%d %b %Y"
"#;
    let config: AppConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.defaults.view, View::Performance);
    assert_eq!(config.defaults.date_format, "%d %b %Y");
}

// ---------------------------------------------------------------------------
// Loading from disk
// ---------------------------------------------------------------------------

#[test]
fn load_global_fixture() {
    let path = Path::new("tests/fixtures/global_config.toml");
    let config = load_config(Some(path)).unwrap();
    assert_eq!(config.defaults.view, View::Map);
    assert_eq!(config.defaults.refetch_interval_minutes, 15);
    assert!((config.defaults.preview.width - 0.5).abs() < f64::EPSILON);
    assert!(config.defaults.heatmap);
    assert_eq!(
        config.backend.citizen_app_url.as_deref(),
        Some("https://citizen.example.gov")
    );
    let roster = config.roster();
    assert_eq!(roster.workers().len(), 2);
    assert_eq!(roster.find(11).unwrap().active_issues, 2);
}

#[test]
fn invalid_toml_produces_error() {
    let path = Path::new("tests/fixtures/invalid_toml.toml");
    let result = load_config(Some(path));
    assert!(result.is_err());
    let err_msg = format!("{:#}", result.unwrap_err());
    assert!(
        err_msg.contains("invalid_toml.toml"),
        "error should mention file: {err_msg}"
    );
}

#[test]
fn unknown_keys_in_fixture_tolerated() {
    let path = Path::new("tests/fixtures/unknown_keys_config.toml");
    let config = load_config(Some(path)).unwrap();
    assert_eq!(config.backend.base_url, "http://localhost:4000");
}

#[test]
fn missing_config_file_produces_error() {
    let path = Path::new("tests/fixtures/nonexistent.toml");
    assert!(load_config(Some(path)).is_err());
}

#[test]
fn config_written_to_a_temp_dir_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[backend]
timeout_secs = 3
"#,
    )
    .unwrap();
    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.backend.timeout_secs, 3);
}
