use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;

/// Fixed upper bound on the permission prompt. The platform adapter usually
/// has its own shorter timeout; this one fires when the platform never
/// answers at all.
pub const PERMISSION_TIMEOUT: Duration = Duration::from_secs(9);

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("location permission was denied; allow location access in the system settings and try again")]
    Denied,
    #[error("timed out waiting for location permission; try again")]
    TimedOut,
    #[error("this device does not support location services")]
    Unsupported,
}

type Resolution = Result<(), PermissionError>;

/// Handed to the platform adapter. Cloneable so that success and error
/// callbacks can each hold one; only the first resolution counts, later
/// firings are ignored.
#[derive(Clone)]
pub struct PermissionResolver {
    tx: Arc<Mutex<Option<oneshot::Sender<Resolution>>>>,
}

impl PermissionResolver {
    fn new() -> (Self, oneshot::Receiver<Resolution>) {
        let (tx, rx) = oneshot::channel();
        (
            PermissionResolver {
                tx: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    pub fn grant(&self) {
        self.resolve(Ok(()));
    }

    pub fn deny(&self, error: PermissionError) {
        self.resolve(Err(error));
    }

    fn resolve(&self, resolution: Resolution) {
        if let Some(tx) = self.tx.lock().unwrap().take() {
            // the receiver may already be gone after a timeout
            let _ = tx.send(resolution);
        }
    }
}

/// Platform seam for the permission prompt. `request` must not block; the
/// adapter resolves asynchronously through the resolver.
pub trait PermissionRequester: Send + Sync {
    fn request(&self, resolver: PermissionResolver);
}

pub async fn request_permission(requester: &dyn PermissionRequester) -> Resolution {
    request_permission_with_timeout(requester, PERMISSION_TIMEOUT).await
}

pub async fn request_permission_with_timeout(
    requester: &dyn PermissionRequester,
    deadline: Duration,
) -> Resolution {
    let (resolver, rx) = PermissionResolver::new();
    requester.request(resolver);
    match tokio::time::timeout(deadline, rx).await {
        Ok(Ok(resolution)) => resolution,
        // the adapter dropped the resolver without answering
        Ok(Err(_)) => Err(PermissionError::TimedOut),
        Err(_) => Err(PermissionError::TimedOut),
    }
}
