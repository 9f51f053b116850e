use chrono::{DateTime, Utc};
use unicode_width::UnicodeWidthChar;

/// Format a timestamp according to the configured date format.
///
/// `"relative"` (or empty) renders ages like `"2h"` or `"3d"`; anything else
/// is a `strftime` pattern.
pub(crate) fn format_date(dt: &DateTime<Utc>, date_format: &str) -> String {
    if date_format.is_empty() || date_format == "relative" {
        format_relative_time(dt, Utc::now())
    } else {
        dt.format(date_format).to_string()
    }
}

/// Format an optional raw timestamp, falling back to the raw text when it
/// does not parse and to `"-"` when it is missing.
pub(crate) fn format_timestamp(
    parsed: Option<DateTime<Utc>>,
    raw: &str,
    date_format: &str,
) -> String {
    match parsed {
        Some(dt) => format_date(&dt, date_format),
        None if raw.trim().is_empty() => "-".to_owned(),
        None => raw.to_owned(),
    }
}

fn format_relative_time(dt: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(dt);

    let minutes = duration.num_minutes();
    if minutes < 1 {
        return "now".to_owned();
    }
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = duration.num_hours();
    if hours < 24 {
        return format!("{hours}h");
    }
    let days = duration.num_days();
    match days {
        0..7 => format!("{days}d"),
        7..30 => format!("{}w", days / 7),
        30..365 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}

/// Format a day count with one decimal, e.g. `"2.5 days"`.
pub(crate) fn format_days(days: Option<f64>) -> String {
    match days {
        Some(d) if (d - 1.0).abs() < f64::EPSILON => "1.0 day".to_owned(),
        Some(d) => format!("{d:.1} days"),
        None => "-".to_owned(),
    }
}

/// Format a 0..=1 ratio as a whole percentage.
pub(crate) fn format_percent(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "-".to_owned(), |r| format!("{:.0}%", r * 100.0))
}

/// Truncate to at most `max_width` terminal columns, ending with `…` when
/// anything was cut.
pub(crate) fn truncate_to_width(text: &str, max_width: usize) -> String {
    if unicode_width::UnicodeWidthStr::width(text) <= max_width {
        return text.to_owned();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}
