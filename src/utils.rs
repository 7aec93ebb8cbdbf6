use chrono::{Datelike, NaiveDate};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Anything with a geographic position. Implemented by timestamped samples
/// (field form) and by bare waypoints (pair form) so the distance functions
/// work on both.
pub trait GeoPoint {
    fn latitude(&self) -> f64;
    fn longitude(&self) -> f64;
}

pub fn haversine_km(a: &impl GeoPoint, b: &impl GeoPoint) -> f64 {
    let d_lat = (b.latitude() - a.latitude()).to_radians();
    let d_lng = (b.longitude() - a.longitude()).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude().to_radians().cos()
            * b.latitude().to_radians().cos()
            * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Sum of consecutive great-circle distances. Sequences shorter than two
/// points have no distance.
pub fn route_distance_km<P: GeoPoint>(points: &[P]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points.windows(2).map(|w| haversine_km(&w[0], &w[1])).sum()
}

/// Coordinates are stored and compared with 6 decimal digits (~0.11m).
pub fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

// We could just use num days from ce instead of epoch, but ce is quite far
// away and epoch keeps the stored integers small.
lazy_static! {
    static ref EPOCH_NUM_OF_DAYS_FROM_CE: i32 = NaiveDate::from_ymd_opt(1970, 1, 1)
        .unwrap()
        .num_days_from_ce();
}

pub fn date_to_days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - *EPOCH_NUM_OF_DAYS_FROM_CE
}

pub fn date_of_days_since_epoch(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + *EPOCH_NUM_OF_DAYS_FROM_CE)
}

pub mod db {
    use anyhow::Result;
    use rusqlite::{OptionalExtension, Transaction};

    pub fn init_metadata_and_get_version(tx: &Transaction) -> Result<i32> {
        tx.execute(
            "CREATE TABLE IF NOT EXISTS metadata (key TEXT PRIMARY KEY NOT NULL UNIQUE, value TEXT);",
            (),
        )?;
        let version: Option<String> = tx
            .query_row("SELECT value FROM metadata WHERE key = 'version';", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(version.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    pub fn set_version_in_metadata(tx: &Transaction, version: i32) -> Result<()> {
        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('version', ?1);",
            (version.to_string(),),
        )?;
        Ok(())
    }
}
