use crate::utils::{haversine_km, GeoPoint};

/// A single raw location fix as delivered by the sample source. Immutable
/// once captured.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: i64,
}

impl GeoPoint for LocationSample {
    fn latitude(&self) -> f64 {
        self.latitude
    }
    fn longitude(&self) -> f64 {
        self.longitude
    }
}

pub const GLITCH_DISPLACEMENT_M: f64 = 200.0;
pub const GLITCH_SPEED_KMH: f64 = 200.0;

/// Drops physically implausible jumps: a sample is rejected when it is both
/// more than `GLITCH_DISPLACEMENT_M` away from the last *retained* sample and
/// the implied speed exceeds `GLITCH_SPEED_KMH`. Rejected samples do not
/// advance the last-retained reference. Duplicate locations are kept so
/// stationary dwell time survives.
pub fn filter_glitches(samples: &[LocationSample]) -> Vec<LocationSample> {
    let mut retained: Vec<LocationSample> = Vec::with_capacity(samples.len());
    for sample in samples {
        let last = match retained.last() {
            None => {
                retained.push(sample.clone());
                continue;
            }
            Some(last) => last,
        };
        let distance_km = haversine_km(last, sample);
        let elapsed_sec = ((sample.timestamp_ms - last.timestamp_ms) as f64 / 1000.0).max(1.0);
        let speed_kmh = distance_km / (elapsed_sec / 3600.0);
        if distance_km * 1000.0 > GLITCH_DISPLACEMENT_M && speed_kmh > GLITCH_SPEED_KMH {
            debug!(
                "dropping glitch sample: {:.0}m from last retained at {:.0}km/h",
                distance_km * 1000.0,
                speed_kmh
            );
            continue;
        }
        retained.push(sample.clone());
    }
    retained
}

/// 3-point moving average over latitude and longitude, clamping the window at
/// the boundaries by reusing the nearest available neighbor. The timestamp of
/// each smoothed point is the center sample's timestamp. Sequences shorter
/// than 3 are returned unsmoothed.
pub fn smooth(samples: &[LocationSample]) -> Vec<LocationSample> {
    if samples.len() < 3 {
        return samples.to_vec();
    }
    (0..samples.len())
        .map(|i| {
            let window = [
                &samples[i.saturating_sub(1)],
                &samples[i],
                &samples[(i + 1).min(samples.len() - 1)],
            ];
            LocationSample {
                latitude: window.iter().map(|s| s.latitude).sum::<f64>() / 3.0,
                longitude: window.iter().map(|s| s.longitude).sum::<f64>() / 3.0,
                timestamp_ms: samples[i].timestamp_ms,
            }
        })
        .collect()
}

/// Full preprocessing applied when a capture stops. Always returns a new
/// value; the raw path is untouched. Paths shorter than 2 samples pass
/// through unchanged.
pub fn filter_and_smooth(samples: &[LocationSample]) -> Vec<LocationSample> {
    if samples.len() < 2 {
        return samples.to_vec();
    }
    smooth(&filter_glitches(samples))
}
