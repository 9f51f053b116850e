use civic_board::color::{Color, ColorDepth};
use civic_board::config::types::AppConfig;
use civic_board::theme::{Background, ResolvedTheme};
use civic_board::types::{IssueStatus, Priority};

use crossterm::style::Color as Term;

#[test]
fn parse_hex_6_digit() {
    let c = Color::parse("#c0caf5", "test_field").unwrap();
    assert_eq!(
        c,
        Color::Hex {
            r: 0xc0,
            g: 0xca,
            b: 0xf5
        }
    );
}

#[test]
fn parse_hex_3_digit() {
    let c = Color::parse("#f0a", "test_field").unwrap();
    // #f0a → r=0xff, g=0x00, b=0xaa
    assert_eq!(
        c,
        Color::Hex {
            r: 0xff,
            g: 0x00,
            b: 0xaa
        }
    );
}

#[test]
fn parse_ansi_index_and_names() {
    assert_eq!(Color::parse("0", "f").unwrap(), Color::Ansi256(0));
    assert_eq!(Color::parse("255", "f").unwrap(), Color::Ansi256(255));
    assert_eq!(Color::parse("Bright_Blue", "f").unwrap(), Color::Ansi256(12));
    assert_eq!(Color::parse("grey", "f").unwrap(), Color::Ansi256(8));
}

#[test]
fn parse_rejects_garbage() {
    assert!(Color::parse("256", "f").is_err());
    assert!(Color::parse("#12", "f").is_err());
    assert!(Color::parse("#gggggg", "f").is_err());
    let err = Color::parse("mauve", "status.pending").unwrap_err();
    assert!(err.to_string().contains("status.pending"));
}

#[test]
fn truecolor_keeps_hex() {
    let c = Color::Hex {
        r: 0x16,
        g: 0xa3,
        b: 0x4a,
    };
    assert_eq!(
        c.to_crossterm_color(ColorDepth::TrueColor),
        Term::Rgb {
            r: 0x16,
            g: 0xa3,
            b: 0x4a
        }
    );
}

#[test]
fn low_palette_slots_use_terminal_names() {
    assert_eq!(Color::Ansi256(9).to_crossterm_color(ColorDepth::TrueColor), Term::Red);
    assert_eq!(Color::Ansi256(8).to_crossterm_color(ColorDepth::Color256), Term::DarkGrey);
}

#[test]
fn color256_approximates_hex() {
    let c = Color::Hex { r: 255, g: 0, b: 0 };
    assert_eq!(c.to_crossterm_color(ColorDepth::Color256), Term::AnsiValue(196));
    assert_eq!(
        Color::Ansi256(100).to_crossterm_color(ColorDepth::Color256),
        Term::AnsiValue(100)
    );
}

#[test]
fn color16_degrades_to_named_colors() {
    let red = Color::Hex { r: 255, g: 0, b: 0 };
    assert_eq!(red.to_crossterm_color(ColorDepth::Color16), Term::Red);
    let white = Color::Hex {
        r: 255,
        g: 255,
        b: 255,
    };
    assert_eq!(white.to_crossterm_color(ColorDepth::Color16), Term::White);
    assert!(!matches!(
        Color::Ansi256(46).to_crossterm_color(ColorDepth::Color16),
        Term::AnsiValue(_) | Term::Rgb { .. }
    ));
}

#[test]
fn display_round_trips_through_parse() {
    let c = Color::Hex {
        r: 0xc0,
        g: 0xca,
        b: 0xf5,
    };
    assert_eq!(c.to_string(), "#c0caf5");
    assert_eq!(c.to_string().parse::<Color>().unwrap(), c);
    assert_eq!(Color::Ansi256(42).to_string(), "42");
}

// ---------------------------------------------------------------------------
// Theme resolution
// ---------------------------------------------------------------------------

#[test]
fn status_overrides_reach_the_resolved_theme() {
    let toml = r##"
[theme.colors.status]
verified = "#00ff00"

[theme.colors.priority]
high = "bright-red"
"##;
    let config: AppConfig = toml::from_str(toml).unwrap();
    let theme = ResolvedTheme::resolve(&config.theme, Background::Dark);
    assert_eq!(
        theme.status_color(IssueStatus::Verified),
        Color::Hex { r: 0, g: 255, b: 0 }
    );
    assert_eq!(theme.priority_color(Priority::High), Color::Ansi256(9));
    // Untouched statuses keep the built-in palette.
    assert_ne!(
        theme.status_color(IssueStatus::Pending),
        theme.status_color(IssueStatus::Rejected)
    );
}

#[test]
fn light_and_dark_defaults_differ() {
    let config = AppConfig::default();
    let dark = ResolvedTheme::resolve(&config.theme, Background::Dark);
    let light = ResolvedTheme::resolve(&config.theme, Background::Light);
    assert_ne!(dark.text_primary, light.text_primary);
    assert_ne!(dark.bg_selected, light.bg_selected);
}

#[test]
fn every_theme_slot_degrades_to_16_colors() {
    let theme = ResolvedTheme::default();
    let mut all = vec![
        theme.text_primary,
        theme.text_secondary,
        theme.text_faint,
        theme.text_warning,
        theme.text_success,
        theme.text_error,
        theme.bg_selected,
        theme.border_primary,
        theme.border_faint,
        theme.priority_high,
        theme.priority_medium,
        theme.priority_low,
    ];
    all.extend(
        [
            IssueStatus::Pending,
            IssueStatus::Assigned,
            IssueStatus::InProgress,
            IssueStatus::WorkCompleted,
            IssueStatus::Verified,
            IssueStatus::Rejected,
        ]
        .map(|s| theme.status_color(s)),
    );
    for color in all {
        let ct = color.to_crossterm_color(ColorDepth::Color16);
        assert!(
            !matches!(ct, Term::AnsiValue(_) | Term::Rgb { .. }),
            "{color} should degrade to a named color, got {ct:?}"
        );
    }
}
