//! Display helpers for trace statistics and sample popups.

use chrono::{DateTime, Local};

use crate::LocationSource;

/// Rendered for timestamps that do not parse.
pub const INVALID_DATE: &str = "Invalid Date";

const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_MINUTE: i64 = 60_000;

/// Render an RFC 3339 timestamp as a local date and time, e.g. `1/1/2023, 10:00:00 AM`.
///
/// Unparseable input yields [`INVALID_DATE`] rather than an error.
pub fn format_date_time(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt
            .with_timezone(&Local)
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string(),
        Err(_) => INVALID_DATE.to_string(),
    }
}

/// `"{h}h {m}m"` when at least one whole hour, otherwise `"{m}m"`.
///
/// Hours are floored. Minutes come from the sign-keeping remainder, so a
/// negative duration renders with negative minutes instead of wrapping.
///
/// ```rust
/// use fleet_trace::format::format_duration;
///
/// assert_eq!(format_duration(5_400_000), "1h 30m");
/// assert_eq!(format_duration(1_800_000), "30m");
/// ```
pub fn format_duration(milliseconds: i64) -> String {
    let hours = milliseconds.div_euclid(MS_PER_HOUR);
    let minutes = (milliseconds % MS_PER_HOUR).div_euclid(MS_PER_MINUTE);

    if hours >= 1 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Label for a source code; unknown codes are returned unchanged.
pub fn format_source(code: &str) -> String {
    LocationSource::from(code).label().to_string()
}

pub fn format_distance(km: f64) -> String {
    format!("{:.2} km", km)
}

pub fn format_speed(kmh: f64) -> String {
    format!("{:.1} km/h", kmh)
}
