use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A theme color: an ANSI palette index or a 24-bit RGB value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Ansi256(u8),
    Hex { r: u8, g: u8, b: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorDepth {
    #[default]
    TrueColor,
    Color256,
    Color16,
}

#[derive(Debug, Error)]
#[error("invalid color value for field \"{field}\": \"{value}\"")]
pub struct ColorParseError {
    pub field: String,
    pub value: String,
}

/// Names accepted in config files, mapped to the 16 base palette slots.
const NAMED: [(&str, u8); 16] = [
    ("black", 0),
    ("red", 1),
    ("green", 2),
    ("yellow", 3),
    ("blue", 4),
    ("magenta", 5),
    ("cyan", 6),
    ("white", 7),
    ("gray", 8),
    ("bright-red", 9),
    ("bright-green", 10),
    ("bright-yellow", 11),
    ("bright-blue", 12),
    ("bright-magenta", 13),
    ("bright-cyan", 14),
    ("bright-white", 15),
];

/// RGB values used when a base palette slot has to be compared or
/// down-sampled.
const BASE16: [(u8, u8, u8); 16] = [
    (0, 0, 0),
    (128, 0, 0),
    (0, 128, 0),
    (128, 128, 0),
    (0, 0, 128),
    (128, 0, 128),
    (0, 128, 128),
    (192, 192, 192),
    (128, 128, 128),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (0, 0, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Hex { r, g, b }
    }

    /// Parse a color string; `field` names the config key in errors.
    ///
    /// Accepts `"#RRGGBB"`, `"#RGB"`, a palette index `"0"`..`"255"`, or one
    /// of the base names (`"red"`, `"bright-blue"`, `"grey"`...).
    pub fn parse(s: &str, field: &str) -> Result<Self, ColorParseError> {
        let make_err = || ColorParseError {
            field: field.to_owned(),
            value: s.to_owned(),
        };
        let s = s.trim();

        if let Some(hex) = s.strip_prefix('#') {
            if !hex.is_ascii() {
                return Err(make_err());
            }
            let digit = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16).map_err(|_| make_err())
            };
            return match hex.len() {
                6 => Ok(Color::rgb(digit(0..2)?, digit(2..4)?, digit(4..6)?)),
                3 => Ok(Color::rgb(
                    digit(0..1)? * 17,
                    digit(1..2)? * 17,
                    digit(2..3)? * 17,
                )),
                _ => Err(make_err()),
            };
        }

        if s.bytes().all(|b| b.is_ascii_digit()) && !s.is_empty() {
            let n: u16 = s.parse().map_err(|_| make_err())?;
            return u8::try_from(n).map(Color::Ansi256).map_err(|_| make_err());
        }

        let name = s.to_ascii_lowercase().replace(['_', ' '], "-").replace("grey", "gray");
        NAMED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, idx)| Color::Ansi256(*idx))
            .ok_or_else(make_err)
    }

    /// Convert to a crossterm color for the given terminal depth.
    ///
    /// Indices 0-15 go through crossterm's named variants so the terminal's
    /// own palette applies.
    pub fn to_crossterm_color(self, depth: ColorDepth) -> crossterm::style::Color {
        match (depth, self) {
            (_, Color::Ansi256(n)) if n < 16 => base16_to_crossterm(n),
            (ColorDepth::TrueColor, Color::Hex { r, g, b }) => {
                crossterm::style::Color::Rgb { r, g, b }
            }
            (ColorDepth::TrueColor | ColorDepth::Color256, Color::Ansi256(n)) => {
                crossterm::style::Color::AnsiValue(n)
            }
            (ColorDepth::Color256, Color::Hex { r, g, b }) => {
                crossterm::style::Color::AnsiValue(nearest_ansi256(r, g, b))
            }
            (ColorDepth::Color16, c) => {
                let (r, g, b) = c.to_rgb();
                base16_to_crossterm(nearest_base16(r, g, b))
            }
        }
    }

    pub fn to_rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Hex { r, g, b } => (r, g, b),
            Color::Ansi256(n) => ansi256_to_rgb(n),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Ansi256(n) => write!(f, "{n}"),
            Color::Hex { r, g, b } => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s, "<unknown>")
    }
}

impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Color depth detection
// ---------------------------------------------------------------------------

impl ColorDepth {
    /// Detect terminal color depth from `COLORTERM` / `TERM`.
    pub fn detect() -> Self {
        let colorterm = std::env::var("COLORTERM").unwrap_or_default();
        let term = std::env::var("TERM").unwrap_or_default();
        Self::from_env_values(&colorterm, &term)
    }

    fn from_env_values(colorterm: &str, term: &str) -> Self {
        if colorterm == "truecolor" || colorterm == "24bit" {
            ColorDepth::TrueColor
        } else if term.contains("256color") {
            ColorDepth::Color256
        } else {
            ColorDepth::Color16
        }
    }
}

// ---------------------------------------------------------------------------
// Palette math
// ---------------------------------------------------------------------------

fn base16_to_crossterm(n: u8) -> crossterm::style::Color {
    use crossterm::style::Color;
    match n {
        0 => Color::Black,
        1 => Color::DarkRed,
        2 => Color::DarkGreen,
        3 => Color::DarkYellow,
        4 => Color::DarkBlue,
        5 => Color::DarkMagenta,
        6 => Color::DarkCyan,
        7 => Color::Grey,
        8 => Color::DarkGrey,
        9 => Color::Red,
        10 => Color::Green,
        11 => Color::Yellow,
        12 => Color::Blue,
        13 => Color::Magenta,
        14 => Color::Cyan,
        15 => Color::White,
        _ => Color::AnsiValue(n),
    }
}

const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

fn ansi256_to_rgb(n: u8) -> (u8, u8, u8) {
    match n {
        0..=15 => BASE16[usize::from(n)],
        16..=231 => {
            let i = n - 16;
            (
                CUBE_LEVELS[usize::from(i / 36)],
                CUBE_LEVELS[usize::from((i / 6) % 6)],
                CUBE_LEVELS[usize::from(i % 6)],
            )
        }
        232..=255 => {
            let v = 8 + 10 * (n - 232);
            (v, v, v)
        }
    }
}

fn distance(a: (u8, u8, u8), b: (u8, u8, u8)) -> u32 {
    let d = |x: u8, y: u8| u32::from(x.abs_diff(y)).pow(2);
    d(a.0, b.0) + d(a.1, b.1) + d(a.2, b.2)
}

/// Nearest index in the 6x6x6 cube or the grayscale ramp.
fn nearest_ansi256(r: u8, g: u8, b: u8) -> u8 {
    (16..=255u8)
        .min_by_key(|&i| distance((r, g, b), ansi256_to_rgb(i)))
        .unwrap_or(16)
}

fn nearest_base16(r: u8, g: u8, b: u8) -> u8 {
    (0..16u8)
        .min_by_key(|&i| distance((r, g, b), BASE16[usize::from(i)]))
        .unwrap_or(7)
}
