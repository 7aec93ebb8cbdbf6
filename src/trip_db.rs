use std::cmp::Ordering;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Transaction};

use crate::route_geometry::RouteGeometry;
use crate::trip::{TripRecord, TripStore};
use crate::utils;

/* The default trip store: one sqlite file per user, used mostly as a small
blob store with transaction support.

`trip` keeps all finalized trips. Each row stores the record as a JSON header
blob plus a few numeric index columns for ordering and totals, and an
optional compressed geometry blob. Rows are append-only; the single allowed
mutation is clearing the evidence reference inside the header.
*/

#[allow(clippy::type_complexity)]
fn open_db_and_run_migration(
    support_dir: &str,
    file_name: &str,
    migrations: &[&dyn Fn(&Transaction) -> Result<()>],
) -> Result<Connection> {
    debug!("open and run migration for {}", file_name);
    let mut conn = rusqlite::Connection::open(Path::new(support_dir).join(file_name))?;
    let tx = conn.transaction()?;

    let version = utils::db::init_metadata_and_get_version(&tx)? as usize;
    let target_version = migrations.len();
    debug!(
        "current version = {}, target_version = {}",
        version, target_version
    );
    match version.cmp(&target_version) {
        Ordering::Equal => (),
        Ordering::Less => {
            for i in version..target_version {
                info!("running migration for version: {}", i + 1);
                let f = migrations.get(i).unwrap();
                f(&tx)?;
            }
            utils::db::set_version_in_metadata(&tx, target_version as i32)?;
        }
        Ordering::Greater => {
            bail!(
                "version too high: current version = {}, target_version = {}",
                version,
                target_version
            );
        }
    }
    tx.commit()?;
    Ok(conn)
}

/// Aggregate over all stored trips.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Totals {
    pub distance_km: f64,
    pub co2_gram: f64,
    pub co2_saved_gram: f64,
    pub points: i64,
}

pub struct TripDb {
    conn: Mutex<Connection>,
}

impl TripDb {
    /// Opens (creating if needed) the trip database of a single user.
    pub fn open(support_dir: &str, user: &str) -> Result<TripDb> {
        let conn = open_db_and_run_migration(
            support_dir,
            &format!("trips-{}.db", user),
            &[&|tx| {
                let sql = "
                CREATE TABLE trip (
                    id             TEXT    PRIMARY KEY
                                           NOT NULL
                                           UNIQUE,
                    trip_date      INTEGER NOT NULL, -- days since epoch
                    distance_km    REAL    NOT NULL,
                    co2_gram       REAL    NOT NULL,
                    co2_saved_gram REAL    NOT NULL,
                    points         INTEGER NOT NULL,
                    header         BLOB    NOT NULL,
                    route          BLOB
                );
                CREATE INDEX trip_date_index ON trip (
                    trip_date DESC
                );
                ";
                for s in sql_split::split(sql) {
                    tx.execute(&s, ())?;
                }
                Ok(())
            }],
        )?;
        Ok(TripDb {
            conn: Mutex::new(conn),
        })
    }

    pub fn append_trip(&self, trip: &TripRecord, route: Option<&RouteGeometry>) -> Result<()> {
        if trip.distance_km < 0.0 {
            bail!("trip distance must not be negative: {}", trip.distance_km);
        }
        if self.get_trip(&trip.id)?.is_some() {
            // records are immutable, re-emitting the same id is a no-op
            info!("trip with id {} already stored, skip insert", trip.id);
            return Ok(());
        }

        let header_bytes = serde_json::to_vec(trip)?;
        let route_bytes = match route {
            None => None,
            Some(route) => {
                let mut buf = Vec::new();
                route.serialize(&mut buf)?;
                Some(buf)
            }
        };

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let sql = "INSERT INTO trip (id, trip_date, distance_km, co2_gram, co2_saved_gram, points, header, route) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);";
        tx.execute(
            sql,
            (
                &trip.id,
                utils::date_to_days_since_epoch(trip.date),
                trip.distance_km,
                trip.co2_gram,
                trip.co2_saved_gram,
                trip.points,
                header_bytes,
                route_bytes,
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    /// The single allowed post-creation mutation.
    pub fn clear_evidence(&self, trip_id: &str) -> Result<()> {
        info!("clearing evidence reference for trip {}", trip_id);
        let mut trip = self
            .get_trip(trip_id)?
            .ok_or_else(|| anyhow!("no trip with id = {}", trip_id))?;
        trip.evidence = None;
        let header_bytes = serde_json::to_vec(&trip)?;

        let conn = self.conn.lock().unwrap();
        let changes = conn.execute(
            "UPDATE trip SET header = ?1 WHERE id = ?2;",
            (header_bytes, trip_id),
        )?;
        if changes == 1 {
            Ok(())
        } else {
            Err(anyhow!("failed to update trip with id = {}", trip_id))
        }
    }

    pub fn get_trip(&self, trip_id: &str) -> Result<Option<TripRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut query = conn.prepare("SELECT header FROM trip WHERE id = ?1;")?;
        let header_bytes: Option<Vec<u8>> = query
            .query_row([trip_id], |row| row.get(0))
            .optional()?;
        match header_bytes {
            None => Ok(None),
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        }
    }

    pub fn get_route(&self, trip_id: &str) -> Result<Option<RouteGeometry>> {
        let conn = self.conn.lock().unwrap();
        let mut query = conn.prepare("SELECT route FROM trip WHERE id = ?1;")?;
        let route_bytes: Option<Option<Vec<u8>>> = query
            .query_row([trip_id], |row| row.get(0))
            .optional()?;
        match route_bytes.flatten() {
            None => Ok(None),
            Some(bytes) => Ok(Some(RouteGeometry::deserialize(&bytes[..])?)),
        }
    }

    /// All trips, newest first.
    pub fn query_trips(&self) -> Result<Vec<TripRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut query = conn.prepare(
            // use `id` to break ties
            "SELECT header FROM trip ORDER BY trip_date DESC, id;",
        )?;
        let mut rows = query.query(())?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            let header_bytes = row.get_ref(0)?.as_blob()?;
            let trip: TripRecord = serde_json::from_slice(header_bytes)?;
            results.push(trip);
        }
        Ok(results)
    }

    pub fn query_trips_for_date(&self, date: NaiveDate) -> Result<Vec<TripRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut query =
            conn.prepare("SELECT header FROM trip WHERE trip_date = ?1 ORDER BY id;")?;
        let mut rows = query.query((utils::date_to_days_since_epoch(date),))?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            let header_bytes = row.get_ref(0)?.as_blob()?;
            let trip: TripRecord = serde_json::from_slice(header_bytes)?;
            results.push(trip);
        }
        Ok(results)
    }

    pub fn totals(&self) -> Result<Totals> {
        let conn = self.conn.lock().unwrap();
        let totals = conn.query_row(
            "SELECT COALESCE(SUM(distance_km), 0), COALESCE(SUM(co2_gram), 0), COALESCE(SUM(co2_saved_gram), 0), COALESCE(SUM(points), 0) FROM trip;",
            (),
            |row| {
                Ok(Totals {
                    distance_km: row.get(0)?,
                    co2_gram: row.get(1)?,
                    co2_saved_gram: row.get(2)?,
                    points: row.get(3)?,
                })
            },
        )?;
        Ok(totals)
    }
}

impl TripStore for TripDb {
    fn append_trip(&self, trip: &TripRecord, route: Option<&RouteGeometry>) -> Result<()> {
        TripDb::append_trip(self, trip, route)
    }

    fn clear_evidence(&self, trip_id: &str) -> Result<()> {
        TripDb::clear_evidence(self, trip_id)
    }
}
