use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::emissions::TransportMode;
use crate::route_geometry::RouteGeometry;

/// Reference to an opaque evidence blob (image/video) held by the host. The
/// blob itself is never copied into the record, only its location and a
/// content digest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRef {
    pub uri: String,
    pub digest: String,
}

impl EvidenceRef {
    pub fn from_bytes(uri: &str, bytes: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(bytes);
        EvidenceRef {
            uri: uri.to_string(),
            digest: hex::encode(hasher.finalize()),
        }
    }
}

/// A finalized trip. Created once at finalization and immutable afterwards,
/// except that the evidence reference may be cleared to null.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub id: String,
    pub date: NaiveDate,
    pub mode: TransportMode,
    pub note: Option<String>,
    pub distance_km: f64,
    pub duration_min: i64,
    pub co2_gram: f64,
    pub co2_saved_gram: f64,
    pub points: i64,
    pub max_speed_kmh: Option<f64>,
    pub suspicious: Option<bool>,
    pub evidence: Option<EvidenceRef>,
}

/// Append-only sink for finalized trips. The only supported mutation after
/// creation is clearing a trip's evidence reference.
pub trait TripStore: Send + Sync {
    fn append_trip(&self, trip: &TripRecord, route: Option<&RouteGeometry>) -> Result<()>;
    fn clear_evidence(&self, trip_id: &str) -> Result<()>;
}
