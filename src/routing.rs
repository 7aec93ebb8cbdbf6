use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use strum_macros::Display;
use thiserror::Error;

use crate::emissions::TransportMode;
use crate::route_geometry::Waypoint;
use crate::utils::round6;

/// The transport network the routing lookup searches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum RoutingProfile {
    #[strum(serialize = "foot")]
    Foot,
    #[strum(serialize = "bicycle")]
    Bicycle,
    #[strum(serialize = "driving")]
    Driving,
}

impl RoutingProfile {
    /// Walking and cycling have dedicated networks; every other declared
    /// mode (transit included) falls back to the driving network.
    pub fn for_mode(mode: TransportMode) -> Self {
        match mode {
            TransportMode::Walk => RoutingProfile::Foot,
            TransportMode::Bike => RoutingProfile::Bicycle,
            _ => RoutingProfile::Driving,
        }
    }

    pub fn to_int(self) -> i8 {
        match self {
            RoutingProfile::Foot => 0,
            RoutingProfile::Bicycle => 1,
            RoutingProfile::Driving => 2,
        }
    }

    pub fn of_int(i: i8) -> Result<Self> {
        match i {
            0 => Ok(RoutingProfile::Foot),
            1 => Ok(RoutingProfile::Bicycle),
            2 => Ok(RoutingProfile::Driving),
            _ => bail!("invalid routing profile: {}", i),
        }
    }
}

/// The routing service is unreliable by default; every variant is recovered
/// locally by the road snapper and never surfaced to the caller.
#[derive(Debug, Error)]
pub enum RoutingLookupError {
    #[error("routing request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("routing service returned {status} for {url}")]
    InvalidResponse {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("malformed routing payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error("routing response contained no usable route")]
    NoRoute,
}

#[async_trait]
pub trait RoutingLookup: Send + Sync {
    /// One route between two points on the given network, as an ordered
    /// (longitude, latitude) list.
    async fn fetch_route(
        &self,
        origin: Waypoint,
        destination: Waypoint,
        profile: RoutingProfile,
    ) -> Result<Vec<Waypoint>, RoutingLookupError>;
}

pub const OSRM_BASE_URL: &str = "https://router.project-osrm.org";

/// Default lookup against a public OSRM instance.
pub struct OsrmLookup {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    // GeoJSON order: [lng, lat]
    coordinates: Vec<[f64; 2]>,
}

impl OsrmLookup {
    pub fn new() -> Self {
        Self::with_base_url(OSRM_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        OsrmLookup {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RoutingLookup for OsrmLookup {
    async fn fetch_route(
        &self,
        origin: Waypoint,
        destination: Waypoint,
        profile: RoutingProfile,
    ) -> Result<Vec<Waypoint>, RoutingLookupError> {
        let url = format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url,
            profile,
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude
        );
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RoutingLookupError::InvalidResponse { status, url });
        }
        let body = response.text().await?;
        let payload: OsrmResponse = serde_json::from_str(&body)?;
        let route = payload
            .routes
            .into_iter()
            .next()
            .ok_or(RoutingLookupError::NoRoute)?;
        if route.geometry.coordinates.is_empty() {
            return Err(RoutingLookupError::NoRoute);
        }
        Ok(route
            .geometry
            .coordinates
            .into_iter()
            .map(|[lng, lat]| Waypoint {
                longitude: round6(lng),
                latitude: round6(lat),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_selection() {
        assert_eq!(
            RoutingProfile::for_mode(TransportMode::Walk),
            RoutingProfile::Foot
        );
        assert_eq!(
            RoutingProfile::for_mode(TransportMode::Bike),
            RoutingProfile::Bicycle
        );
        for mode in [
            TransportMode::Bus,
            TransportMode::CommuterRail,
            TransportMode::Metro,
            TransportMode::Motorcycle,
            TransportMode::Car,
        ] {
            assert_eq!(RoutingProfile::for_mode(mode), RoutingProfile::Driving);
        }
    }

    #[test]
    fn parses_osrm_payload() {
        let body = r#"{"code":"Ok","routes":[{"geometry":{"coordinates":[[106.8166664,-6.2],[106.817,-6.201]],"type":"LineString"},"distance":130.1}],"waypoints":[]}"#;
        let payload: OsrmResponse = serde_json::from_str(body).unwrap();
        assert_eq!(payload.routes.len(), 1);
        assert_eq!(payload.routes[0].geometry.coordinates[0], [106.8166664, -6.2]);
    }
}
