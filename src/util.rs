// Utility helpers for parsing and number formatting.
//
// This module centralizes the forgiving CSV/number/date handling so the
// rest of the code can assume clean, typed values.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (commas, spaces, text).
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok()
}

/// Strict hours parse for input files. Commas are not stripped, so
/// `"1,5"` is rejected instead of read as fifteen.
pub fn parse_hours(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|h| h.is_finite())
}

/// Float coercion for aggregated hours: the longest leading number
/// (`"1,5"` is 1, `"1e1"` is 10), anything else is zero.
pub fn coerce_hours(s: Option<&str>) -> f64 {
    let s = s.unwrap_or("").trim();
    let b = s.as_bytes();
    let mut end = 0;
    if end < b.len() && (b[end] == b'+' || b[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    while end < b.len() && b[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < b.len() && b[end] == b'.' {
        let mut j = end + 1;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > end + 1 {
            digits += j - end - 1;
            end = j;
        }
    }
    if digits == 0 {
        return 0.0;
    }
    if end < b.len() && (b[end] == b'e' || b[end] == b'E') {
        let mut j = end + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }
    s[..end].parse::<f64>().unwrap_or(0.0)
}

pub fn parse_u32_safe(s: Option<&str>) -> Option<u32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<u32>().ok()
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    // CSV dates are expected in `YYYY-MM-DD` format.
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Fixed two-decimal rendering of an hours sum, with `.` swapped for the
/// locale's decimal separator: `3.5` with `","` gives `"3,50"`.
pub fn format_hours(sum: f64, decimal_separator: &str) -> String {
    format!("{:.2}", sum).replace('.', decimal_separator)
}

/// Like [`format_hours`] but blank for a zero sum.
pub fn format_hours_or_blank(sum: f64, decimal_separator: &str) -> String {
    if sum > 0.0 {
        format_hours(sum, decimal_separator)
    } else {
        String::new()
    }
}

/// The value's own string form (`2.0`, `2.5`, `0.25`), no rounding, with
/// the decimal separator substituted.
pub fn hours_to_s(hours: f64, decimal_separator: &str) -> String {
    format!("{:?}", hours).replace('.', decimal_separator)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed number of decimal places plus thousands separators
    // (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages (e.g., `9,855 entries loaded`).
    n.to_formatted_string(&Locale::en)
}

/// Escape text for HTML attributes and bodies.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
