#![allow(dead_code)]

use greenmiles_core::gps_processor::LocationSample;
use greenmiles_core::route_geometry::Waypoint;

// one degree of latitude on a 6371km sphere
pub const METERS_PER_DEGREE_LAT: f64 = 111_194.926_6;

pub const BASE_LAT: f64 = -6.2;
pub const BASE_LNG: f64 = 106.816666;
pub const BASE_TIMESTAMP_MS: i64 = 1_697_349_116_000;

pub fn sample(latitude: f64, longitude: f64, timestamp_ms: i64) -> LocationSample {
    LocationSample {
        latitude,
        longitude,
        timestamp_ms,
    }
}

/// A straight path heading north: `n` samples spaced `spacing_m` apart, one
/// every `interval_ms`.
pub fn northbound_path(n: usize, spacing_m: f64, interval_ms: i64) -> Vec<LocationSample> {
    (0..n)
        .map(|i| LocationSample {
            latitude: BASE_LAT + (i as f64 * spacing_m) / METERS_PER_DEGREE_LAT,
            longitude: BASE_LNG,
            timestamp_ms: BASE_TIMESTAMP_MS + i as i64 * interval_ms,
        })
        .collect()
}

pub fn waypoints_of(samples: &[LocationSample]) -> Vec<Waypoint> {
    samples
        .iter()
        .map(|s| Waypoint {
            longitude: s.longitude,
            latitude: s.latitude,
        })
        .collect()
}
