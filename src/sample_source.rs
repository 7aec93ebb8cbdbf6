use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::gps_processor::LocationSample;

/// Transient location-provider faults. Reported, never fatal: an ongoing
/// capture continues across them.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CaptureError {
    #[error("location provider fault: {0}")]
    Provider(String),
    #[error("location provider unavailable")]
    Unavailable,
    #[error("no position fix within {0:?}")]
    FixTimeout(Duration),
}

/// Accuracy/timeout configuration for a single-shot position query.
#[derive(Clone, Copy, Debug)]
pub struct FixRequest {
    pub high_accuracy: bool,
    pub timeout: Duration,
}

impl Default for FixRequest {
    fn default() -> Self {
        FixRequest {
            high_accuracy: true,
            timeout: Duration::from_secs(8),
        }
    }
}

/// Handle for an active sample subscription.
pub trait SampleSubscription: Send {
    fn cancel(self: Box<Self>);
}

/// External source of timestamped location samples. Continuous delivery is
/// host-driven: after `subscribe`, the host feeds each fix into
/// `TripRecorder::on_location_update` (and faults into `on_location_error`)
/// until the subscription is cancelled. Delivery is assumed serialized.
#[async_trait]
pub trait SampleSource: Send + Sync {
    async fn current_position(&self, request: FixRequest) -> Result<LocationSample, CaptureError>;

    fn subscribe(&self) -> Box<dyn SampleSubscription>;
}
