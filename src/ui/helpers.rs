//! Shared rendering utilities and helpers.
//!
//! Low-level pieces used across the components: cursor positioning, search
//! match highlighting, and the text formatting of names, durations, and start
//! times. The formatting helpers are pure so the view model can be tested
//! without a terminal.

use crate::ui::theme::Theme;
use chrono::DateTime;

/// Positions the cursor at a specific row and column.
///
/// Uses ANSI escape sequence `\u{1b}[{row};{col}H` to move the cursor.
/// Coordinates are 1-indexed (row 1 = first row, col 1 = first column).
pub fn position_cursor(row: usize, col: usize) {
    print!("\u{1b}[{row};{col}H");
}

/// Renders text with highlighted character ranges for search matches.
///
/// Highlighted sections use the match highlight colors unless the row is
/// selected, in which case the selection colors take precedence and the text
/// is printed plainly.
///
/// Ranges are `(start, end)` character indices, sorted and non-overlapping,
/// as produced by [`match_ranges`].
pub fn render_highlighted_text(
    text: &str,
    ranges: &[(usize, usize)],
    theme: &Theme,
    is_selected: bool,
    base_fg: &str,
) {
    if ranges.is_empty() || is_selected {
        print!("{text}");
        return;
    }

    let chars: Vec<char> = text.chars().collect();
    let mut current_pos = 0;

    for &(start, end) in ranges {
        let start = start.min(chars.len());
        let end = end.min(chars.len());
        if start < current_pos || start >= end {
            continue;
        }

        if start > current_pos {
            let normal_section: String = chars[current_pos..start].iter().collect();
            print!("{normal_section}");
        }

        print!("{}", Theme::fg(&theme.colors.match_highlight_fg));
        print!("{}", Theme::bg(&theme.colors.match_highlight_bg));
        let highlighted_section: String = chars[start..end].iter().collect();
        print!("{highlighted_section}");
        print!("{}", Theme::reset());
        print!("{}", Theme::fg(base_fg));

        current_pos = end;
    }

    if current_pos < chars.len() {
        let remaining: String = chars[current_pos..].iter().collect();
        print!("{remaining}");
    }
}

/// Character ranges of every non-overlapping, case-insensitive occurrence of
/// `needle` in `text`.
///
/// `needle` is expected lowercase, as stored in the normalized filters.
/// Returns nothing when lowercasing would change the character count, since
/// the ranges could then point at the wrong characters.
///
/// ```
/// use reportlens::ui::helpers::match_ranges;
///
/// assert_eq!(match_ranges("test_Login_login", "login"), vec![(5, 10), (11, 16)]);
/// assert!(match_ranges("test_cart", "").is_empty());
/// ```
#[must_use]
pub fn match_ranges(text: &str, needle: &str) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return vec![];
    }

    let hay: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();
    if hay.len() != text.chars().count() {
        return vec![];
    }
    let pattern: Vec<char> = needle.chars().collect();

    let mut ranges = Vec::new();
    let mut i = 0;
    while i + pattern.len() <= hay.len() {
        if hay[i..i + pattern.len()] == pattern[..] {
            ranges.push((i, i + pattern.len()));
            i += pattern.len();
        } else {
            i += 1;
        }
    }
    ranges
}

/// Cuts `text` to at most `width` characters, ending in `...` when cut.
#[must_use]
pub fn truncate(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return text.to_string();
    }
    if width <= 3 {
        return text.chars().take(width).collect();
    }
    let kept: String = text.chars().take(width - 3).collect();
    format!("{kept}...")
}

/// Formats seconds as `0.42s`, `12.3s`, or `2m 05s`. Unknown or invalid
/// durations format as an empty string.
#[must_use]
pub fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => {
            if s < 10.0 {
                format!("{s:.2}s")
            } else if s < 60.0 {
                format!("{s:.1}s")
            } else {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let whole = s.round() as u64;
                format!("{}m {:02}s", whole / 60, whole % 60)
            }
        }
        _ => String::new(),
    }
}

/// Formats a Unix timestamp as `HH:MM:SS` UTC.
#[must_use]
pub fn format_start_time(timestamp: Option<f64>) -> String {
    timestamp
        .filter(|t| t.is_finite())
        .and_then(|t| {
            #[allow(clippy::cast_possible_truncation)]
            let secs = t.floor() as i64;
            DateTime::from_timestamp(secs, 0)
        })
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_ranges_are_case_insensitive_and_disjoint() {
        assert_eq!(match_ranges("AddItem", "add"), vec![(0, 3)]);
        assert_eq!(match_ranges("aaaa", "aa"), vec![(0, 2), (2, 4)]);
        assert!(match_ranges("cart", "zzz").is_empty());
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("test_checkout_flow", 10), "test_ch...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn durations_pick_a_readable_unit() {
        assert_eq!(format_duration(Some(0.4)), "0.40s");
        assert_eq!(format_duration(Some(12.34)), "12.3s");
        assert_eq!(format_duration(Some(125.0)), "2m 05s");
        assert_eq!(format_duration(Some(f64::NAN)), "");
        assert_eq!(format_duration(None), "");
    }

    #[test]
    fn start_times_render_as_utc_clock() {
        assert_eq!(format_start_time(Some(1_714_557_600.5)), "10:00:00");
        assert_eq!(format_start_time(Some(f64::INFINITY)), "");
        assert_eq!(format_start_time(None), "");
    }
}
