pub mod test_utils;

use assert_float_eq::assert_float_absolute_eq;
use greenmiles_core::speed::{is_suspicious, max_speed_kmh, SUSPICIOUS_SPEED_KMH};
use test_utils::{northbound_path, sample, BASE_LAT, BASE_LNG, BASE_TIMESTAMP_MS, METERS_PER_DEGREE_LAT};

#[test]
fn no_speed_without_two_samples() {
    assert_eq!(max_speed_kmh(&[]), 0.0);
    assert_eq!(
        max_speed_kmh(&[sample(BASE_LAT, BASE_LNG, BASE_TIMESTAMP_MS)]),
        0.0
    );
}

#[test]
fn hundred_meters_in_a_second_is_suspicious() {
    let samples = vec![
        sample(BASE_LAT, BASE_LNG, BASE_TIMESTAMP_MS),
        sample(
            BASE_LAT + 100.0 / METERS_PER_DEGREE_LAT,
            BASE_LNG,
            BASE_TIMESTAMP_MS + 1000,
        ),
    ];
    let max = max_speed_kmh(&samples);
    assert_float_absolute_eq!(max, 360.0, 0.5);
    assert!(is_suspicious(max));
}

#[test]
fn walking_pace_is_not_suspicious() {
    // 10m every 5s is 7.2km/h
    let samples = northbound_path(10, 10.0, 5000);
    let max = max_speed_kmh(&samples);
    assert_float_absolute_eq!(max, 7.2, 0.1);
    assert!(!is_suspicious(max));
}

#[test]
fn duplicate_timestamps_are_floored_at_one_second() {
    let samples = vec![
        sample(BASE_LAT, BASE_LNG, BASE_TIMESTAMP_MS),
        sample(
            BASE_LAT + 10.0 / METERS_PER_DEGREE_LAT,
            BASE_LNG,
            BASE_TIMESTAMP_MS,
        ),
    ];
    // 10m over a floored 1s window
    assert_float_absolute_eq!(max_speed_kmh(&samples), 36.0, 0.1);
}

#[test]
fn threshold_is_exclusive() {
    assert!(!is_suspicious(SUSPICIOUS_SPEED_KMH));
    assert!(is_suspicious(SUSPICIOUS_SPEED_KMH + 0.01));
}
