// ── Device session ──
//
// Full lifecycle of one device session: a StateStore, the poller keeping
// it fresh, and the control coordinator writing through it. Torn down with
// `dispose()`, after which nothing reaches consumers.

use std::sync::Arc;

use esplink_api::DeviceClient;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::control::ControlCoordinator;
use crate::error::{ControlRejection, CoreError};
use crate::history;
use crate::model::{AnalogSample, ControlRequest, SessionEvent, SessionSnapshot};
use crate::poller::{Poller, TickReport};
use crate::store::StateStore;
use crate::stream::SnapshotStream;
use crate::transport::Transport;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<SessionInner>`.
pub struct Session<T: Transport> {
    inner: Arc<SessionInner<T>>,
}

struct SessionInner<T: Transport> {
    config: SessionConfig,
    transport: Arc<T>,
    store: Arc<StateStore>,
    poller: Poller<T>,
    control: ControlCoordinator<T>,
}

impl<T: Transport> Clone for Session<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Session<DeviceClient> {
    /// Build a gateway HTTP client from `config` and wrap it in a session.
    /// Does not start polling; call [`start()`](Self::start).
    pub fn connect(config: SessionConfig) -> Result<Self, CoreError> {
        let client = DeviceClient::new(config.base_url.clone(), &config.transport())?;
        debug!(url = %config.base_url, "gateway client ready");
        Ok(Self::new(client, config))
    }
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        let transport = Arc::new(transport);
        let store = Arc::new(StateStore::new());
        let poller = Poller::new(Arc::clone(&transport), Arc::clone(&store));
        let control = ControlCoordinator::new(Arc::clone(&transport), Arc::clone(&store));
        Self {
            inner: Arc::new(SessionInner {
                config,
                transport,
                store,
                poller,
                control,
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn poller(&self) -> &Poller<T> {
        &self.inner.poller
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Arm the poller at the configured interval. No-op once disposed.
    pub fn start(&self) {
        if self.is_disposed() {
            return;
        }
        self.inner.poller.start(self.inner.config.poll_interval);
        info!(url = %self.inner.config.base_url, "session started");
    }

    /// Poll once now, outside the timer.
    pub async fn refresh(&self) -> TickReport {
        self.inner.poller.poll_once().await
    }

    /// Tear the session down: stop accepting writes, cancel the poller and
    /// wait for its loop and any control sends to finish. Responses that
    /// land meanwhile are discarded. Idempotent.
    pub async fn dispose(&self) {
        if !self.inner.store.dispose() {
            return;
        }
        if let Some(handle) = self.inner.poller.stop() {
            let _ = handle.await;
        }
        self.inner.control.wait().await;
        info!("session disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.store.is_disposed()
    }

    // ── State access ─────────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.inner.store.snapshot()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        self.inner.store.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.store.events()
    }

    pub fn dismiss_error(&self) -> bool {
        self.inner.store.dismiss_error()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Submit a control command; see [`ControlCoordinator::submit`].
    pub fn submit_control(&self, desired_value: bool) -> Result<ControlRequest, ControlRejection> {
        self.inner.control.submit(desired_value)
    }

    /// Read-only analog history. Does not touch session state.
    pub async fn history(&self, limit: u32) -> Result<Vec<AnalogSample>, CoreError> {
        history::fetch_history(self.inner.transport.as_ref(), limit).await
    }
}
