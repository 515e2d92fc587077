//! Human-readable formatting for bytes, rates, durations and clock labels.

use chrono::{DateTime, TimeZone};

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
const STEP: f64 = 1024.0;

/// Binary-prefix byte formatting with one decimal place.
///
/// `0` renders as `"0 B"`. Values past the terabyte range stay in `TB`
/// rather than wrapping or overflowing the unit table.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".into();
    }
    // floor(log1024(n)) in integers so exact powers of 1024 land on their unit.
    let mut idx = 0;
    let mut threshold = 1024u64;
    while idx < UNITS.len() - 1 && bytes >= threshold {
        idx += 1;
        threshold = threshold.saturating_mul(1024);
    }
    let scaled = bytes as f64 / STEP.powi(idx as i32);
    format!("{:.1} {}", scaled, UNITS[idx])
}

pub fn format_speed(bytes_per_sec: u64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec))
}

/// Bytes expressed in (binary) gigabytes, as plotted by the memory chart.
pub fn bytes_to_gb(bytes: u64) -> f32 {
    (bytes as f64 / (STEP * STEP * STEP)) as f32
}

pub fn percent_of(used: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64 * 100.0) as f32
    }
}

pub fn format_percent(pct: f32) -> String {
    format!("{:.1}%", pct)
}

pub fn format_duration(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let mins = (secs % 3600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, mins)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

pub fn format_frequency(mhz: u64) -> String {
    if mhz == 0 {
        "--".into()
    } else {
        format!("{:.2} GHz", mhz as f64 / 1000.0)
    }
}

/// Label attached to history points.
pub fn history_label<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%H:%M:%S").to_string()
}

pub fn clock_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%I:%M %p").to_string()
}

pub fn clock_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%A, %B %-d").to_string()
}
