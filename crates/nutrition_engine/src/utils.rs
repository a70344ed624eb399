//! Rounding and calendar helpers shared by the engine components.

use chrono::NaiveDate;

/// Round to `decimals` places, halves towards positive infinity.
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor + 0.5).floor() / factor
}

/// Round to the nearest integer, halves towards positive infinity.
pub fn round_to_int(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// `consumed / goal` as a percentage, or 0 when no goal is set.
pub fn percent_of(consumed: f64, goal: f64) -> f64 {
    if goal > 0.0 {
        consumed * 100.0 / goal
    } else {
        0.0
    }
}

/// Parse a log date.
///
/// Accepts:
/// - YYYY-MM-DD
/// - RFC3339 datetime (date part)
/// - Naive datetime YYYY-MM-DDTHH:MM:SS (date part)
pub fn parse_log_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(ndt.date());
    }
    None
}

/// Every calendar date from `start` to `end` inclusive; empty when `start > end`.
pub fn dates_in_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}
