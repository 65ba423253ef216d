//! Display formatting for catalog entries and player labels.
//!
//! Sizes use binary prefixes (1 KB = 1024 bytes). Dates are rendered in the
//! `en-US` shapes the catalog pages show.

use chrono::{DateTime, Utc};

const CATALOG_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
const ALL_UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// `floor(log1024(bytes))`, capped at `max_index`. Exact powers of 1024 land
/// on the larger unit.
fn unit_index(bytes: u64, max_index: usize) -> usize {
    let mut index = 0;
    let mut threshold: u128 = 1024;
    while index < max_index && u128::from(bytes) >= threshold {
        index += 1;
        threshold *= 1024;
    }
    index
}

/// Catalog size label: `size / 1024^i` with two decimals, Bytes through GB.
///
/// `0` renders as `"0 Bytes"`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let i = unit_index(bytes, CATALOG_UNITS.len() - 1);
    let scaled = bytes as f64 / 1024f64.powi(i as i32);
    format!("{:.2} {}", scaled, CATALOG_UNITS[i])
}

/// General byte formatter with trailing zeros trimmed (`1536` -> `"1.5 KB"`).
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let i = unit_index(bytes, ALL_UNITS.len() - 1);
    let scaled = bytes as f64 / 1024f64.powi(i as i32);
    let fixed = format!("{:.*}", decimals, scaled);
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    format!("{} {}", trimmed, ALL_UNITS[i])
}

/// Long date, e.g. `"October 18, 2026"`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Short numeric date, e.g. `"10/18/2026"`.
pub fn format_short_date(date: &DateTime<Utc>) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// General date/time label, e.g. `"10/18/2026 3:04 PM"`.
pub fn format_general_date(date: &DateTime<Utc>) -> String {
    date.format("%-m/%-d/%Y %-I:%M %p").to_string()
}

/// `m:ss`, or `h:mm:ss` once the duration reaches an hour.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let remaining = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, remaining)
    } else {
        format!("{}:{:02}", minutes, remaining)
    }
}

/// Player clock label: whole minutes and seconds, `m:ss`.
///
/// Negative or non-finite input renders as `0:00`.
pub fn format_time(time: f64) -> String {
    let total = if time.is_finite() && time > 0.0 {
        time.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
