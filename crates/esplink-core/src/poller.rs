// ── Background status poller ──
//
// Each tick fans out a status fetch and an output-value fetch. Both are
// decoded and proposed to the StateStore as they arrive, independently of
// each other. A tick is skipped, not queued, while the previous one is
// still running.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use esplink_api::Payload;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::decode::{decode_output, decode_status};
use crate::error::{FetchError, TransportError};
use crate::store::{Applied, StateStore};
use crate::transport::Transport;

/// What one tick did to the store. A successful status read always
/// reports `Updated`, since it refreshes `last_status_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub status: Applied,
    pub output: Applied,
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct PollerInner<T> {
    transport: Arc<T>,
    store: Arc<StateStore>,
    running: Mutex<Option<Running>>,
    skipped: AtomicU64,
}

/// Periodic poller feeding one `StateStore`.
///
/// Cheaply cloneable; clones share the same timer.
pub struct Poller<T: Transport> {
    inner: Arc<PollerInner<T>>,
}

impl<T: Transport> Clone for Poller<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> Poller<T> {
    pub fn new(transport: Arc<T>, store: Arc<StateStore>) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                transport,
                store,
                running: Mutex::new(None),
                skipped: AtomicU64::new(0),
            }),
        }
    }

    /// Arm the timer. The first tick fires immediately. Replaces any loop
    /// already running. Must be called within a tokio runtime.
    pub fn start(&self, interval: Duration) {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(self.clone(), interval, cancel.clone()));
        let previous = self
            .inner
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Running { cancel, handle });
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
        debug!(interval_ms = interval.as_millis(), "poller started");
    }

    /// Cancel the timer. Idempotent. Returns the loop handle on the call
    /// that actually stopped it, so callers can wait for the loop to exit.
    ///
    /// A tick already in flight is not aborted; its results still go
    /// through the store, which discards them once disposed.
    pub fn stop(&self) -> Option<JoinHandle<()>> {
        let running = self
            .inner
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        running.cancel.cancel();
        debug!("poller stopped");
        Some(running.handle)
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|r| !r.cancel.is_cancelled())
    }

    /// Ticks skipped because the previous one had not finished.
    pub fn skipped_ticks(&self) -> u64 {
        self.inner.skipped.load(Ordering::Relaxed)
    }

    /// Run one tick inline and return once both fetches have been applied.
    pub async fn poll_once(&self) -> TickReport {
        self.run_tick().await
    }

    async fn run_tick(&self) -> TickReport {
        let store = &self.inner.store;
        let transport = &self.inner.transport;
        let captured = store.output_version();

        let status = async {
            let result = fetch(transport.fetch_status(), decode_status).await;
            log_failure("status", &result);
            store.apply_status(&result)
        };
        let output = async {
            let result = fetch(transport.fetch_output_value(), decode_output).await;
            log_failure("output", &result);
            store.apply_output(captured, &result)
        };
        let (status, output) = tokio::join!(status, output);
        trace!(?status, ?output, "tick applied");
        TickReport { status, output }
    }
}

async fn fetch<R>(
    request: impl Future<Output = Result<Payload, TransportError>>,
    decode: fn(&Payload) -> Result<R, FetchError>,
) -> Result<R, FetchError> {
    let payload = request.await?;
    decode(&payload)
}

fn log_failure<R>(what: &'static str, result: &Result<R, FetchError>) {
    match result {
        Ok(_) => {}
        Err(FetchError::Decode(e)) => warn!(fetch = what, error = %e, "discarding undecodable response"),
        Err(e) => debug!(fetch = what, error = %e, "poll fetch failed"),
    }
}

async fn poll_loop<T: Transport>(poller: Poller<T>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight: Option<JoinHandle<TickReport>> = None;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if in_flight.as_ref().is_some_and(|h| !h.is_finished()) {
                    let skipped = poller.inner.skipped.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(skipped, "previous tick still running, skipping");
                } else {
                    let tick = poller.clone();
                    in_flight = Some(tokio::spawn(async move { tick.run_tick().await }));
                }
            }
        }
    }
}
