use itertools::Itertools;

use crate::gps_processor::LocationSample;
use crate::utils::haversine_km;

/// Advisory-only threshold; trips above it are tagged, never rejected.
pub const SUSPICIOUS_SPEED_KMH: f64 = 20.0;

/// Maximum instantaneous speed over the path. Elapsed time is floored at one
/// second so duplicate or near-duplicate timestamps cannot blow the ratio
/// up. Paths shorter than 2 samples have no speed.
pub fn max_speed_kmh(samples: &[LocationSample]) -> f64 {
    samples
        .iter()
        .tuple_windows()
        .map(|(prev, curr)| {
            let distance_km = haversine_km(prev, curr);
            let elapsed_sec = ((curr.timestamp_ms - prev.timestamp_ms) as f64 / 1000.0).max(1.0);
            distance_km / (elapsed_sec / 3600.0)
        })
        .fold(0.0, f64::max)
}

pub fn is_suspicious(max_speed_kmh: f64) -> bool {
    max_speed_kmh > SUSPICIOUS_SPEED_KMH
}
