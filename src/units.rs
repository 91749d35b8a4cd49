// SPDX-License-Identifier: MIT

//! Distance, duration, and pace conversion/formatting helpers.
//!
//! All pure functions. Distances normalize to miles, durations to
//! minutes, using the fixed constants 1 mi = 1.609344 km = 1609.344 m.

/// Kilometers per mile.
pub const KM_PER_MILE: f64 = 1.609344;
/// Meters per mile.
pub const METERS_PER_MILE: f64 = 1609.344;

/// Convert a distance with a declared unit to miles. Unknown or absent
/// units are taken as miles (the network's historical default).
/// Negative or non-finite values yield `None`.
pub fn distance_to_miles(value: f64, unit: Option<&str>) -> Option<f64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let miles = match unit.map(|u| u.trim().to_lowercase()).as_deref() {
        Some("km") | Some("kilometer") | Some("kilometers") => value / KM_PER_MILE,
        Some("m") | Some("meter") | Some("meters") => value / METERS_PER_MILE,
        _ => value,
    };
    Some(miles)
}

/// Parse a duration string into minutes.
///
/// Accepts `HH:MM:SS`, `MM:SS`, or a bare number of minutes. Seconds
/// become a fractional minutes remainder. Returns `None` on anything
/// unparseable or negative.
pub fn parse_duration_minutes(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if value.contains(':') {
        let parts: Vec<&str> = value.split(':').collect();
        let nums: Option<Vec<u32>> = parts.iter().map(|p| p.trim().parse().ok()).collect();
        return match nums?.as_slice() {
            [minutes, seconds] => Some(f64::from(*minutes) + f64::from(*seconds) / 60.0),
            [hours, minutes, seconds] => {
                Some(f64::from(*hours) * 60.0 + f64::from(*minutes) + f64::from(*seconds) / 60.0)
            }
            _ => None,
        };
    }

    match value.parse::<f64>() {
        Ok(minutes) if minutes.is_finite() && minutes >= 0.0 => Some(minutes),
        _ => None,
    }
}

/// Convert a duration with a declared unit element to minutes.
pub fn duration_to_minutes(value: &str, unit: Option<&str>) -> Option<f64> {
    match unit.map(|u| u.trim().to_lowercase()).as_deref() {
        Some("s") | Some("sec") | Some("secs") | Some("seconds") => {
            let seconds: f64 = value.trim().parse().ok()?;
            (seconds.is_finite() && seconds >= 0.0).then_some(seconds / 60.0)
        }
        Some("h") | Some("hr") | Some("hrs") | Some("hours") => {
            let hours: f64 = value.trim().parse().ok()?;
            (hours.is_finite() && hours >= 0.0).then_some(hours * 60.0)
        }
        _ => parse_duration_minutes(value),
    }
}

/// Format fractional minutes for display: `"28 min"` on whole minutes,
/// `"28:30"` when there is a seconds remainder.
pub fn format_minutes(minutes: f64) -> String {
    let whole = minutes.floor() as u64;
    let seconds = ((minutes - minutes.floor()) * 60.0).round() as u64;
    if seconds > 0 {
        format!("{}:{:02}", whole, seconds)
    } else {
        format!("{} min", whole)
    }
}

/// Average pace in `"M:SS min/mi"` form, or `None` when either input
/// is missing or the distance is zero.
pub fn format_pace(distance_miles: Option<f64>, duration_minutes: Option<f64>) -> Option<String> {
    let distance = distance_miles?;
    let duration = duration_minutes?;
    if distance <= 0.0 || duration < 0.0 {
        return None;
    }
    let pace = duration / distance;
    let whole = pace.floor() as u64;
    let seconds = ((pace - pace.floor()) * 60.0).round() as u64;
    Some(format!("{}:{:02} min/mi", whole, seconds))
}
