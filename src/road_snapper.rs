use crate::route_geometry::{RouteGeometry, Waypoint};
use crate::routing::{RoutingLookup, RoutingProfile};
use crate::utils::round6;

/// Upper bound on points per routing lookup.
pub const MAX_SEGMENT_POINTS: usize = 12;

/// A bounded sub-sequence `[start, end]` (inclusive) of the path submitted
/// to the routing lookup as one request. Consecutive windows share exactly
/// one point so stitched output has no gaps and no duplicated edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentWindow {
    pub start: usize,
    pub end: usize,
}

impl SegmentWindow {
    pub fn point_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Partitions `len` points into overlapping windows of at most `max_points`
/// points, advancing by `step = max(2, floor(len / ceil(len / max_points)))`
/// until the final point is covered.
pub fn segment_windows(len: usize, max_points: usize) -> Vec<SegmentWindow> {
    if len < 2 {
        return Vec::new();
    }
    let step = (len / len.div_ceil(max_points)).max(2);
    let mut windows = Vec::new();
    let mut i = 0;
    while i < len - 1 {
        windows.push(SegmentWindow {
            start: i,
            end: (i + step).min(len - 1),
        });
        i += step;
    }
    windows
}

fn coincides(last: Option<&Waypoint>, point: &Waypoint) -> bool {
    match last {
        None => false,
        Some(last) => {
            (last.longitude - point.longitude).abs() < 1e-6
                && (last.latitude - point.latitude).abs() < 1e-6
        }
    }
}

/// Best-effort alignment of a raw point sequence to the transport network.
///
/// One lookup is issued per window, strictly in order: stitching depends on
/// in-order arrival and sequential issuance bounds load on the external
/// service. A failed lookup falls back to piecewise-linear interpolation
/// between the window endpoints with the window's point density, so a route
/// may end up partially snapped and partially interpolated. All emitted
/// coordinates are rounded to 6 decimal digits.
pub async fn snap_to_roads(
    lookup: &dyn RoutingLookup,
    path: &[Waypoint],
    profile: RoutingProfile,
) -> RouteGeometry {
    if path.len() < 2 {
        return RouteGeometry {
            profile,
            snapped: false,
            waypoints: path.to_vec(),
        };
    }

    let mut out: Vec<Waypoint> = Vec::new();
    let mut any_snapped = false;
    for window in segment_windows(path.len(), MAX_SEGMENT_POINTS) {
        let origin = path[window.start];
        let destination = path[window.end];
        match lookup.fetch_route(origin, destination, profile).await {
            Ok(geometry) => {
                any_snapped = true;
                for (idx, point) in geometry.into_iter().enumerate() {
                    let point = Waypoint {
                        longitude: round6(point.longitude),
                        latitude: round6(point.latitude),
                    };
                    // the lookup may echo the junction point back
                    if idx == 0 && coincides(out.last(), &point) {
                        continue;
                    }
                    out.push(point);
                }
            }
            Err(error) => {
                warn!(
                    "routing lookup failed for window [{}, {}], interpolating: {}",
                    window.start, window.end, error
                );
                let len = window.end - window.start;
                for s in 0..=len {
                    let frac = s as f64 / len.max(1) as f64;
                    let point = Waypoint {
                        longitude: round6(
                            origin.longitude + (destination.longitude - origin.longitude) * frac,
                        ),
                        latitude: round6(
                            origin.latitude + (destination.latitude - origin.latitude) * frac,
                        ),
                    };
                    if coincides(out.last(), &point) {
                        continue;
                    }
                    out.push(point);
                }
            }
        }
    }

    if out.len() >= 2 {
        RouteGeometry {
            profile,
            snapped: any_snapped,
            waypoints: out,
        }
    } else {
        RouteGeometry {
            profile,
            snapped: false,
            waypoints: path.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_step_formula() {
        // 25 points: ceil(25/12) = 3 lookups, step 8
        assert_eq!(
            segment_windows(25, 12),
            vec![
                SegmentWindow { start: 0, end: 8 },
                SegmentWindow { start: 8, end: 16 },
                SegmentWindow { start: 16, end: 24 },
            ]
        );
        // minimal path is a single window
        assert_eq!(
            segment_windows(2, 12),
            vec![SegmentWindow { start: 0, end: 1 }]
        );
        assert!(segment_windows(1, 12).is_empty());
    }
}
