use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Placeholder for a metric whose source was unavailable this tick.
pub const UNAVAILABLE: &str = "--";

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Cut `s` so that it occupies at most `max_width` columns, marking the cut
/// with a trailing `~` (the panel fonts are ASCII/Latin-1 only).
pub fn truncate_columns(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width - 1 {
            result.push('~');
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result
}

/// Gigabytes with precision that shrinks as the value grows, so the text
/// stays at four or five characters: `3.71`, `29.8`, `476`.
pub fn format_gib(bytes: u64) -> String {
    let gib = bytes as f64 / GIB;
    if gib < 10.0 {
        format!("{gib:.2}")
    } else if gib < 100.0 {
        format!("{gib:.1}")
    } else {
        format!("{gib:.0}")
    }
}

pub fn format_percent(value: Option<f32>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.0}%", v.clamp(0.0, 100.0)),
        _ => UNAVAILABLE.to_string(),
    }
}

pub fn format_ghz(mhz: Option<f32>) -> String {
    match mhz {
        Some(v) if v.is_finite() => format!("{:.1}GHz", (v / 1000.0).clamp(0.0, 99.9)),
        _ => UNAVAILABLE.to_string(),
    }
}

/// Temperature with a Latin-1 degree sign. Clamped to three integer digits.
pub fn format_celsius(value: Option<f32>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.1}\u{b0}C", v.clamp(-99.9, 199.9)),
        _ => UNAVAILABLE.to_string(),
    }
}

/// Bits per second rendered as megabits with two decimals.
pub fn format_mbps(bps: Option<f64>) -> String {
    match bps {
        Some(v) if v.is_finite() => format!("{:.2}", (v / 1_000_000.0).clamp(0.0, 9999.99)),
        _ => UNAVAILABLE.to_string(),
    }
}

/// A reading in at most `width` characters, dropping decimals (down to none)
/// as the magnitude grows. Out-of-range values are clamped to the widest
/// integer that still fits.
pub fn format_fitted(value: f64, width: usize, max_decimals: usize) -> String {
    if !value.is_finite() {
        return UNAVAILABLE.to_string();
    }
    let digits = width.clamp(1, 15) as i32;
    let high = 10f64.powi(digits) - 1.0;
    let low = -(10f64.powi(digits - 1) - 1.0);
    let value = value.clamp(low, high);
    for decimals in (0..=max_decimals).rev() {
        let text = format!("{value:.decimals$}");
        if text.len() <= width {
            return text;
        }
    }
    format!("{:.0}", value.trunc())
}
