//! # Geo Utilities
//!
//! Great-circle distances, drive-time estimates, clock arithmetic on
//! `HH:MM` strings and the order-independent route fingerprint.

use crate::errors::SpotError;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometres.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Driving time for a distance at a constant speed, truncated to whole minutes.
pub fn driving_minutes(distance_km: f64, speed_kmh: f64) -> i64 {
    (distance_km / speed_kmh * 60.0) as i64
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Parses `HH:MM` into minutes past midnight.
///
/// Anything that is not two colon-separated parts yields 0, and a part that
/// is not a number counts as 0.
pub fn parse_time_to_minutes(time: &str) -> i64 {
    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() != 2 {
        return 0;
    }
    let hours = parts[0].trim().parse::<i64>().unwrap_or(0);
    let minutes = parts[1].trim().parse::<i64>().unwrap_or(0);
    hours * 60 + minutes
}

/// Rejects an `HH:MM` value whose numeric parts fall outside 0-23 and 0-59.
///
/// Parts that are not numbers are left to [`parse_time_to_minutes`], which
/// reads them as 0.
pub fn check_clock(time: &str) -> Result<(), SpotError> {
    let Some((hours, minutes)) = time.split_once(':') else {
        return Ok(());
    };
    let out_of_range = |part: &str, max: i64| {
        part.trim()
            .parse::<i64>()
            .is_ok_and(|value| !(0..=max).contains(&value))
    };
    if out_of_range(hours, 23) || out_of_range(minutes, 59) {
        return Err(SpotError::InvalidInput(format!("invalid time of day: {time}")));
    }
    Ok(())
}

/// Formats minutes past midnight as `HH:MM`. Hours are not wrapped at 24.
pub fn minutes_to_clock(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Builds the fingerprint of a set of spot IDs.
///
/// The IDs are sorted by value, so any permutation of the same IDs gives the
/// same string, e.g. `[1 2 3]`.
pub fn route_fingerprint(ids: &[i64]) -> String {
    let mut sorted = ids.to_vec();
    sorted.sort_unstable();
    let joined = sorted
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    format!("[{joined}]")
}
