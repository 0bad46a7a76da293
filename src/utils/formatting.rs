//! Formatting helpers for CLI output.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Hours with up to two decimals, trailing zeros dropped: 1.25 → "1.25h", 2.0 → "2h".
pub fn format_hours(h: f64) -> String {
    let s = format!("{h:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    format!("{s}h")
}

/// Cut `s` to at most `width` terminal columns, marking the cut with "…".
pub fn truncate(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}
