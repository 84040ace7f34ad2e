// ── Connection probe ──
//
// One poll tick against a throwaway store, for "does this server answer"
// checks. Leaves nothing running.

use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Serializer};
use tokio::time::Instant;
use tracing::debug;

use crate::model::{ConnectionState, DeviceStatus, OutputState, SurfacedError};
use crate::poller::Poller;
use crate::store::StateStore;
use crate::transport::Transport;

/// Outcome of a connection probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    /// The gateway answered at least one fetch.
    pub reachable: bool,
    pub connection: ConnectionState,
    pub device: DeviceStatus,
    pub output: OutputState,
    #[serde(rename = "round_trip_ms", serialize_with = "as_millis")]
    pub round_trip: Duration,
    pub error: Option<SurfacedError>,
}

fn as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Poll `transport` once and report what came back.
pub async fn probe<T: Transport>(transport: T) -> ProbeReport {
    let store = Arc::new(StateStore::new());
    let poller = Poller::new(Arc::new(transport), Arc::clone(&store));

    let started = Instant::now();
    let tick = poller.poll_once().await;
    let round_trip = started.elapsed();

    let snap = store.snapshot();
    store.dispose();
    debug!(?tick, round_trip_ms = round_trip.as_millis(), "probe finished");

    ProbeReport {
        reachable: snap.connection == ConnectionState::Connected,
        connection: snap.connection,
        device: snap.device.clone(),
        output: snap.output,
        round_trip,
        error: snap.last_error.clone(),
    }
}
