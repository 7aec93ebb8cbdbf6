use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use uuid::Uuid;

use crate::emissions::{self, TransportMode};
use crate::gps_processor::{self, LocationSample};
use crate::permission::{self, PermissionError, PermissionRequester};
use crate::road_snapper;
use crate::route_geometry::Waypoint;
use crate::routing::{RoutingLookup, RoutingProfile};
use crate::sample_source::{CaptureError, FixRequest, SampleSource, SampleSubscription};
use crate::speed;
use crate::trip::{EvidenceRef, TripRecord, TripStore};
use crate::utils;

/// Captures shorter than this are discarded instead of saved.
pub const AUTO_SAVE_MIN_METERS: f64 = 30.0;

struct CaptureSession {
    mode: TransportMode,
    evidence: EvidenceRef,
    started_at: DateTime<Utc>,
    path: Vec<LocationSample>,
    subscription: Option<Box<dyn SampleSubscription>>,
}

enum RecorderState {
    Idle,
    Capturing(CaptureSession),
    Stopping,
}

#[derive(Debug, PartialEq)]
pub enum StopOutcome {
    /// The capture was long enough; the record has been emitted to the store.
    Finalized(TripRecord),
    /// Below the auto-save minimum; nothing persisted, buffer cleared.
    Discarded,
    /// Stop without an active session is a guarded no-op.
    NotCapturing,
}

/// The finalization state machine: Idle -> Capturing -> Stopping ->
/// {Finalized | Discarded}. Terminal states are per session; the recorder
/// itself returns to Idle and the next session starts a fresh path.
///
/// Exactly one capture session is active at a time. Sample delivery is
/// assumed serialized by the host; the state mutex is never held across an
/// await.
pub struct TripRecorder {
    source: Arc<dyn SampleSource>,
    permission: Arc<dyn PermissionRequester>,
    routing: Arc<dyn RoutingLookup>,
    store: Arc<dyn TripStore>,
    state: Mutex<RecorderState>,
}

impl TripRecorder {
    pub fn new(
        source: Arc<dyn SampleSource>,
        permission: Arc<dyn PermissionRequester>,
        routing: Arc<dyn RoutingLookup>,
        store: Arc<dyn TripStore>,
    ) -> Self {
        TripRecorder {
            source,
            permission,
            routing,
            store,
            state: Mutex::new(RecorderState::Idle),
        }
    }

    pub fn is_capturing(&self) -> bool {
        matches!(*self.state.lock().unwrap(), RecorderState::Capturing(_))
    }

    /// Single-shot position fix, e.g. for centering a map before a capture
    /// starts.
    pub async fn current_position(
        &self,
        request: FixRequest,
    ) -> Result<LocationSample, CaptureError> {
        self.source.current_position(request).await
    }

    /// Copy of the path captured so far, for live previews.
    pub fn path_snapshot(&self) -> Option<Vec<LocationSample>> {
        match &*self.state.lock().unwrap() {
            RecorderState::Capturing(session) => Some(session.path.clone()),
            _ => None,
        }
    }

    /// Idle -> Capturing. Requires an evidence attachment up front and a
    /// granted permission check; on failure the recorder stays Idle and the
    /// error carries a human-readable reason. Returns false when a session
    /// is already active.
    pub async fn start_capture(
        &self,
        mode: TransportMode,
        evidence: EvidenceRef,
    ) -> Result<bool, PermissionError> {
        {
            let state = self.state.lock().unwrap();
            if !matches!(*state, RecorderState::Idle) {
                info!("start_capture ignored, a session is already active");
                return Ok(false);
            }
        }

        permission::request_permission(self.permission.as_ref()).await?;

        let mut state = self.state.lock().unwrap();
        if !matches!(*state, RecorderState::Idle) {
            // someone else started while we were waiting on the prompt
            return Ok(false);
        }
        *state = RecorderState::Capturing(CaptureSession {
            mode,
            evidence,
            started_at: Utc::now(),
            path: Vec::new(),
            subscription: Some(self.source.subscribe()),
        });
        info!("capture started, mode={}", mode);
        Ok(true)
    }

    /// Appends a sample to the active session's path. Updates outside a
    /// session are ignored.
    pub fn on_location_update(&self, sample: LocationSample) {
        let mut state = self.state.lock().unwrap();
        match &mut *state {
            RecorderState::Capturing(session) => session.path.push(sample),
            _ => debug!("location update outside of a capture session, ignored"),
        }
    }

    /// Transient provider faults are reported but never stop the capture.
    pub fn on_location_error(&self, error: &CaptureError) {
        warn!("location provider error during capture: {}", error);
    }

    /// Capturing -> Stopping -> {Finalized | Discarded}. Cancels the sample
    /// subscription, runs the filter/smoother and the distance calculator,
    /// and either finalizes (snap, speed analysis, emission bookkeeping,
    /// emit to the store) or discards. A failed store append restores the
    /// session so the raw samples survive for a retry.
    pub async fn stop_capture(&self) -> Result<StopOutcome> {
        let mut session = {
            let mut state = self.state.lock().unwrap();
            match std::mem::replace(&mut *state, RecorderState::Stopping) {
                RecorderState::Capturing(session) => session,
                other => {
                    *state = other;
                    info!("stop_capture without an active session is a no-op");
                    return Ok(StopOutcome::NotCapturing);
                }
            }
        };

        if let Some(subscription) = session.subscription.take() {
            subscription.cancel();
        }

        // filtering and smoothing work on derived copies; the raw path stays
        // in the session until the record is safely stored
        let filtered = gps_processor::filter_and_smooth(&session.path);
        let distance_km = utils::route_distance_km(&filtered);

        if distance_km * 1000.0 < AUTO_SAVE_MIN_METERS {
            info!(
                "discarding capture: {:.1}m is below the {}m auto-save minimum",
                distance_km * 1000.0,
                AUTO_SAVE_MIN_METERS
            );
            *self.state.lock().unwrap() = RecorderState::Idle;
            return Ok(StopOutcome::Discarded);
        }

        let duration_min = duration_minutes(session.started_at, Utc::now());
        let waypoints: Vec<Waypoint> = filtered
            .iter()
            .map(|s| Waypoint {
                longitude: s.longitude,
                latitude: s.latitude,
            })
            .collect();
        let profile = RoutingProfile::for_mode(session.mode);
        let route = road_snapper::snap_to_roads(self.routing.as_ref(), &waypoints, profile).await;
        let max_speed_kmh = speed::max_speed_kmh(&filtered);

        let effects = emissions::trip_effects(session.mode, distance_km, None);
        let record = TripRecord {
            id: Uuid::new_v4().as_hyphenated().to_string(),
            date: Local::now().date_naive(),
            mode: session.mode,
            note: None,
            distance_km,
            duration_min,
            co2_gram: effects.co2_gram,
            co2_saved_gram: effects.co2_saved_gram,
            points: effects.points,
            max_speed_kmh: Some(max_speed_kmh),
            suspicious: Some(speed::is_suspicious(max_speed_kmh)),
            evidence: Some(session.evidence.clone()),
        };

        let route = (route.waypoints.len() >= 2).then_some(route);
        if let Err(error) = self.store.append_trip(&record, route.as_ref()) {
            warn!("storing the trip failed, keeping the session for a retry");
            *self.state.lock().unwrap() = RecorderState::Capturing(session);
            return Err(error);
        }

        info!(
            "capture finalized: {:.3}km in {}min, snapped={}",
            record.distance_km,
            record.duration_min,
            route.as_ref().map(|r| r.snapped).unwrap_or(false)
        );
        *self.state.lock().unwrap() = RecorderState::Idle;
        Ok(StopOutcome::Finalized(record))
    }

    /// Manual entry bypasses Capturing/Stopping entirely: a directly
    /// supplied distance and duration produce a finalized record with no
    /// route geometry and no anomaly fields. Evidence is optional here.
    pub fn save_manual_trip(
        &self,
        mode: TransportMode,
        distance_km: f64,
        duration_min: i64,
        note: Option<String>,
        evidence: Option<EvidenceRef>,
    ) -> Result<TripRecord> {
        if distance_km < 0.0 {
            bail!("manual trip distance must not be negative: {}", distance_km);
        }
        let effects = emissions::trip_effects(mode, distance_km, None);
        let record = TripRecord {
            id: Uuid::new_v4().as_hyphenated().to_string(),
            date: Local::now().date_naive(),
            mode,
            note,
            distance_km,
            duration_min: duration_min.max(1),
            co2_gram: effects.co2_gram,
            co2_saved_gram: effects.co2_saved_gram,
            points: effects.points,
            max_speed_kmh: None,
            suspicious: None,
            evidence,
        };
        self.store.append_trip(&record, None)?;
        info!("manual trip saved: {:.3}km, mode={}", distance_km, mode);
        Ok(record)
    }
}

fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (((end - start).num_seconds() as f64 / 60.0).round() as i64).max(1)
}
