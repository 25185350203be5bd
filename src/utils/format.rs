use chrono::{DateTime, Utc};
use ratatui::style::Color;

use crate::data::parse_timestamp;

/// Truncate a string to a maximum number of characters with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len == 0 {
        String::new()
    } else {
        let head: String = s.chars().take(max_len - 1).collect();
        format!("{}…", head)
    }
}

/// Human-readable age of an API timestamp relative to `now`.
pub fn format_relative_time(timestamp: &str, now: DateTime<Utc>) -> String {
    let then = parse_timestamp(timestamp);
    if then == DateTime::<Utc>::MIN_UTC {
        return "unknown".to_string();
    }
    let days = now.signed_duration_since(then).num_days();

    match days {
        d if d <= 0 => "Today".to_string(),
        1 => "1 day ago".to_string(),
        d if d < 7 => format!("{} days ago", d),
        d if d < 30 => format!("{} weeks ago", d / 7),
        d if d < 365 => format!("{} months ago", d / 30),
        d => format!("{} years ago", d / 365),
    }
}

/// Parse a six-digit hex colour. Callers normalise at the fetch boundary.
pub fn hex_to_color(hex: &str) -> Option<Color> {
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

/// Black or white, whichever reads better on the given label colour.
pub fn contrast_color(hex: &str) -> Color {
    match hex_to_color(hex) {
        Some(Color::Rgb(r, g, b)) => {
            let brightness = (r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000;
            if brightness > 128 {
                Color::Black
            } else {
                Color::White
            }
        }
        _ => Color::Black,
    }
}

/// Strip terminal escape sequences from remote text before drawing it.
pub fn sanitize(text: &str) -> String {
    strip_ansi_escapes::strip_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("ééééé", 3), "éé…");
    }

    #[test]
    fn relative_time_buckets() {
        let now = parse_timestamp("2024-06-30T12:00:00Z");
        let ago = |d: i64| (now - Duration::days(d)).to_rfc3339();
        assert_eq!(format_relative_time(&ago(0), now), "Today");
        assert_eq!(format_relative_time(&ago(1), now), "1 day ago");
        assert_eq!(format_relative_time(&ago(3), now), "3 days ago");
        assert_eq!(format_relative_time(&ago(14), now), "2 weeks ago");
        assert_eq!(format_relative_time(&ago(90), now), "3 months ago");
        assert_eq!(format_relative_time(&ago(800), now), "2 years ago");
        assert_eq!(format_relative_time("garbage", now), "unknown");
    }

    #[test]
    fn contrast_follows_brightness() {
        assert_eq!(contrast_color("ffffff"), Color::Black);
        assert_eq!(contrast_color("000000"), Color::White);
        assert_eq!(contrast_color("d73a4a"), Color::White);
    }

    #[test]
    fn escapes_are_removed() {
        assert_eq!(sanitize("\u{1b}[31mred\u{1b}[0m"), "red");
    }
}
