use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Declared transport mode of a trip. Transit modes share the driving
/// routing profile since nothing finer-grained exists upstream.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransportMode {
    Walk,
    Bike,
    Bus,
    CommuterRail,
    Metro,
    Motorcycle,
    Car,
}

impl TransportMode {
    pub fn emission_factor_g_per_km(self) -> f64 {
        match self {
            TransportMode::Walk => 0.0,
            TransportMode::Bike => 0.0,
            TransportMode::Bus => 70.0,
            TransportMode::CommuterRail => 70.0,
            TransportMode::Metro => 65.0,
            TransportMode::Motorcycle => 100.0,
            TransportMode::Car => 150.0,
        }
    }

    pub fn points_per_km(self) -> f64 {
        match self {
            TransportMode::Walk => 10.0,
            TransportMode::Bike => 8.0,
            TransportMode::Bus | TransportMode::CommuterRail | TransportMode::Metro => 5.0,
            TransportMode::Motorcycle | TransportMode::Car => 0.0,
        }
    }

    /// Default baseline for savings: the highest-emission mode.
    pub fn baseline() -> Self {
        TransportMode::iter()
            .max_by(|a, b| {
                a.emission_factor_g_per_km()
                    .total_cmp(&b.emission_factor_g_per_km())
            })
            .unwrap_or(TransportMode::Car)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TripEffects {
    pub co2_gram: f64,
    pub co2_saved_gram: f64,
    pub points: i64,
}

/// Emission and points bookkeeping applied to every finalized trip, GPS
/// derived or manual. Pure function of the per-mode tables.
pub fn trip_effects(
    mode: TransportMode,
    distance_km: f64,
    baseline: Option<TransportMode>,
) -> TripEffects {
    let baseline = baseline.unwrap_or_else(TransportMode::baseline);
    let co2_gram = distance_km * mode.emission_factor_g_per_km();
    let baseline_gram = distance_km * baseline.emission_factor_g_per_km();
    TripEffects {
        co2_gram,
        co2_saved_gram: (baseline_gram - co2_gram).max(0.0),
        points: (distance_km * mode.points_per_km()).round() as i64,
    }
}
