use assert_float_eq::assert_float_absolute_eq;
use chrono::NaiveDate;
use greenmiles_core::emissions::TransportMode;
use greenmiles_core::route_geometry::{RouteGeometry, Waypoint};
use greenmiles_core::routing::RoutingProfile;
use greenmiles_core::trip::{EvidenceRef, TripRecord};
use greenmiles_core::trip_db::{Totals, TripDb};
use tempdir::TempDir;

fn record(id: &str, date: (i32, u32, u32), mode: TransportMode, distance_km: f64) -> TripRecord {
    let points = (distance_km * mode.points_per_km()).round() as i64;
    TripRecord {
        id: id.to_string(),
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        mode,
        note: None,
        distance_km,
        duration_min: 20,
        co2_gram: distance_km * mode.emission_factor_g_per_km(),
        co2_saved_gram: distance_km * (150.0 - mode.emission_factor_g_per_km()),
        points,
        max_speed_kmh: Some(12.0),
        suspicious: Some(false),
        evidence: Some(EvidenceRef::from_bytes("file:///e.jpg", b"evidence")),
    }
}

fn route() -> RouteGeometry {
    RouteGeometry {
        profile: RoutingProfile::Foot,
        snapped: true,
        waypoints: vec![
            Waypoint {
                longitude: 106.816666,
                latitude: -6.2,
            },
            Waypoint {
                longitude: 106.8167,
                latitude: -6.2003,
            },
        ],
    }
}

#[test]
fn append_query_and_totals() {
    let temp_dir = TempDir::new("trip_db-basic").unwrap();
    let db = TripDb::open(temp_dir.path().to_str().unwrap(), "aiko").unwrap();

    let walk = record("t-walk-1", (2025, 8, 28), TransportMode::Walk, 3.2);
    let bus = record("t-bus-1", (2025, 8, 29), TransportMode::Bus, 10.1);
    db.append_trip(&walk, Some(&route())).unwrap();
    db.append_trip(&bus, None).unwrap();

    // newest first
    let trips = db.query_trips().unwrap();
    assert_eq!(trips.len(), 2);
    assert_eq!(trips[0], bus);
    assert_eq!(trips[1], walk);

    let totals = db.totals().unwrap();
    assert_float_absolute_eq!(totals.distance_km, 13.3, 1e-9);
    assert_float_absolute_eq!(totals.co2_gram, 707.0, 1e-9);
    assert_eq!(totals.points, 32 + 51);

    let on_date = db
        .query_trips_for_date(NaiveDate::from_ymd_opt(2025, 8, 28).unwrap())
        .unwrap();
    assert_eq!(on_date, vec![walk]);
}

#[test]
fn geometry_survives_storage() {
    let temp_dir = TempDir::new("trip_db-route").unwrap();
    let db = TripDb::open(temp_dir.path().to_str().unwrap(), "aiko").unwrap();

    let trip = record("t-1", (2025, 8, 28), TransportMode::Walk, 1.0);
    db.append_trip(&trip, Some(&route())).unwrap();

    assert_eq!(db.get_route("t-1").unwrap(), Some(route()));

    let manual = record("t-2", (2025, 8, 28), TransportMode::Bus, 5.0);
    db.append_trip(&manual, None).unwrap();
    assert_eq!(db.get_route("t-2").unwrap(), None);
}

#[test]
fn clearing_evidence_is_the_only_mutation() {
    let temp_dir = TempDir::new("trip_db-evidence").unwrap();
    let db = TripDb::open(temp_dir.path().to_str().unwrap(), "aiko").unwrap();

    let trip = record("t-1", (2025, 8, 28), TransportMode::Walk, 3.2);
    db.append_trip(&trip, None).unwrap();
    db.clear_evidence("t-1").unwrap();

    let stored = db.get_trip("t-1").unwrap().unwrap();
    assert_eq!(stored.evidence, None);
    // everything else is untouched
    assert_eq!(
        stored,
        TripRecord {
            evidence: None,
            ..trip
        }
    );

    assert!(db.clear_evidence("missing").is_err());
}

#[test]
fn duplicate_append_is_skipped() {
    let temp_dir = TempDir::new("trip_db-dup").unwrap();
    let db = TripDb::open(temp_dir.path().to_str().unwrap(), "aiko").unwrap();

    let trip = record("t-1", (2025, 8, 28), TransportMode::Walk, 3.2);
    db.append_trip(&trip, None).unwrap();
    db.append_trip(&trip, None).unwrap();
    assert_eq!(db.query_trips().unwrap().len(), 1);
}

#[test]
fn negative_distance_is_rejected() {
    let temp_dir = TempDir::new("trip_db-invalid").unwrap();
    let db = TripDb::open(temp_dir.path().to_str().unwrap(), "aiko").unwrap();
    let mut trip = record("t-1", (2025, 8, 28), TransportMode::Walk, 3.2);
    trip.distance_km = -1.0;
    assert!(db.append_trip(&trip, None).is_err());
}

#[test]
fn reopening_keeps_data_and_users_apart() {
    let temp_dir = TempDir::new("trip_db-reopen").unwrap();
    let dir = temp_dir.path().to_str().unwrap();
    {
        let db = TripDb::open(dir, "aiko").unwrap();
        let trip = record("t-1", (2025, 8, 28), TransportMode::Walk, 3.2);
        db.append_trip(&trip, None).unwrap();
    }

    // reopening runs the migration check again and finds the data
    let db = TripDb::open(dir, "aiko").unwrap();
    assert_eq!(db.query_trips().unwrap().len(), 1);

    // a different user's store is empty
    let other = TripDb::open(dir, "hasanul").unwrap();
    assert_eq!(other.query_trips().unwrap().len(), 0);
    assert_eq!(other.totals().unwrap(), Totals::default());
}
