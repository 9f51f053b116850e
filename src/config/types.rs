use serde::Deserialize;

use crate::color::Color;
use crate::config::keybindings::KeybindingsConfig;
use crate::map::StatusPalette;
use crate::types::{Roster, Worker};

// ---------------------------------------------------------------------------
// Custom Color deserialization
// ---------------------------------------------------------------------------

/// Deserialize an `Option<Color>` from a TOML string value.
pub(crate) mod color_de {
    use serde::{self, Deserialize, Deserializer};

    use crate::color::Color;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Color>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s {
            None => Ok(None),
            Some(s) => Color::parse(&s, "<theme>")
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub defaults: Defaults,
    /// Worker roster. Empty means the built-in roster.
    pub workers: Vec<Worker>,
    pub theme: Theme,
    pub keybindings: KeybindingsConfig,
}

impl AppConfig {
    pub fn roster(&self) -> Roster {
        if self.workers.is_empty() {
            Roster::builtin()
        } else {
            Roster::new(self.workers.clone())
        }
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Citizen-facing app, shown in the preview and usable in shell
    /// keybindings as `{{.CitizenUrl}}`.
    pub citizen_app_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            citizen_app_url: None,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Issues,
    Map,
    Performance,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub view: View,
    pub preview: PreviewDefaults,
    /// Background refresh period; 0 disables it.
    pub refetch_interval_minutes: u32,
    pub date_format: String,
    /// Whether the map view opens with the heatmap layer on.
    pub heatmap: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            view: View::Issues,
            preview: PreviewDefaults::default(),
            refetch_interval_minutes: 5,
            date_format: "relative".to_owned(),
            heatmap: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewDefaults {
    pub width: f64,
}

impl Default for PreviewDefaults {
    fn default() -> Self {
        Self { width: 0.4 }
    }
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub colors: ColorsTheme,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColorsTheme {
    pub text: TextColors,
    pub background: BgColors,
    pub border: BorderColors,
    pub status: StatusColors,
    pub priority: PriorityColors,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TextColors {
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub primary: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub secondary: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub faint: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub warning: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub success: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub error: Option<Color>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BgColors {
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub selected: Option<Color>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BorderColors {
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub primary: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub faint: Option<Color>,
}

/// Per-status colors, used for the status column, stat tiles and markers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatusColors {
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub pending: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub assigned: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub in_progress: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub work_completed: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub verified: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub rejected: Option<Color>,
}

impl StatusColors {
    /// The built-in palette with any configured overrides applied.
    pub fn palette(&self) -> StatusPalette {
        let d = StatusPalette::default();
        StatusPalette {
            pending: self.pending.unwrap_or(d.pending),
            assigned: self.assigned.unwrap_or(d.assigned),
            in_progress: self.in_progress.unwrap_or(d.in_progress),
            work_completed: self.work_completed.unwrap_or(d.work_completed),
            verified: self.verified.unwrap_or(d.verified),
            rejected: self.rejected.unwrap_or(d.rejected),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PriorityColors {
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub high: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub medium: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub low: Option<Color>,
}
