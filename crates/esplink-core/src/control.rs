// ── Control coordinator ──
//
// Accepts or rejects a control submission synchronously, applies the
// optimistic write, then settles the request in the background once the
// gateway answers.

use std::sync::Arc;

use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::decode::decode_control_ack;
use crate::error::{ControlRejection, FetchError};
use crate::model::ControlRequest;
use crate::store::{Applied, StateStore};
use crate::transport::Transport;

/// Runs control commands for one session, at most one at a time.
pub struct ControlCoordinator<T: Transport> {
    transport: Arc<T>,
    store: Arc<StateStore>,
    tracker: TaskTracker,
}

impl<T: Transport> ControlCoordinator<T> {
    pub fn new(transport: Arc<T>, store: Arc<StateStore>) -> Self {
        Self {
            transport,
            store,
            tracker: TaskTracker::new(),
        }
    }

    /// Submit a control command.
    ///
    /// On acceptance the optimistic value is already visible to subscribers
    /// when this returns; completion arrives as a `SessionEvent`. A rejected
    /// submission sends nothing and emits no event.
    pub fn submit(&self, desired_value: bool) -> Result<ControlRequest, ControlRejection> {
        let request = self
            .store
            .begin_control(desired_value)
            .inspect_err(|reason| warn!(desired_value, %reason, "control rejected"))?;
        info!(request_id = request.id, desired_value, "control submitted");

        let transport = Arc::clone(&self.transport);
        let store = Arc::clone(&self.store);
        let request_id = request.id;
        self.tracker.spawn(async move {
            let result = match transport.send_control(desired_value).await {
                Ok(payload) => decode_control_ack(&payload),
                Err(e) => Err(FetchError::from(e)),
            };
            match &result {
                Ok(ack) if ack.accepted => debug!(request_id, "control acknowledged"),
                Ok(ack) => warn!(request_id, reason = ?ack.reason, "control refused by gateway"),
                Err(e) => warn!(request_id, error = %e, "control request failed"),
            }
            if store.settle_control(request_id, result) == Applied::Disposed {
                debug!(request_id, "session disposed, control result discarded");
            }
        });
        Ok(request)
    }

    /// Stop accepting work and wait for every outstanding request to
    /// settle.
    pub async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
