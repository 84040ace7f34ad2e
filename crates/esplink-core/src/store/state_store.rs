// Serialized write path for one device session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tracing::debug;

use super::apply::{self, Applied};
use crate::decode::{ControlAck, OutputSnapshot, StatusSnapshot};
use crate::error::{ControlRejection, FetchError};
use crate::model::{ControlRequest, SessionEvent, SessionSnapshot};
use crate::stream::SnapshotStream;

const EVENT_CHANNEL_SIZE: usize = 64;

struct Record {
    snapshot: SessionSnapshot,
    next_request_id: u64,
    disposed: bool,
}

/// Owner of a session's state.
///
/// Every mutation goes through one lock, so writes proposed by concurrent
/// fetches are applied one at a time. Readers never take the lock: they
/// read the last published snapshot from a `watch` channel. Once disposed,
/// every proposal is discarded.
pub struct StateStore {
    record: Mutex<Record>,
    snapshot_tx: watch::Sender<Arc<SessionSnapshot>>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(SessionSnapshot::default()));
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            record: Mutex::new(Record {
                snapshot: SessionSnapshot::default(),
                next_request_id: 1,
                disposed: false,
            }),
            snapshot_tx,
            event_tx,
        }
    }

    // ── Read side ────────────────────────────────────────────────────

    /// The last published snapshot.
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.snapshot_tx.subscribe())
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    /// Current `source_version` of the output, captured by pollers before
    /// issuing a fetch.
    pub fn output_version(&self) -> u64 {
        self.lock().snapshot.output.source_version
    }

    // ── Write side ───────────────────────────────────────────────────

    pub(crate) fn apply_status(&self, result: &Result<StatusSnapshot, FetchError>) -> Applied {
        self.update(|record, events| {
            apply::apply_status(&mut record.snapshot, result, Utc::now(), events)
        })
        .unwrap_or(Applied::Disposed)
    }

    pub(crate) fn apply_output(
        &self,
        captured_version: u64,
        result: &Result<OutputSnapshot, FetchError>,
    ) -> Applied {
        self.update(|record, events| {
            apply::apply_output(
                &mut record.snapshot,
                captured_version,
                result,
                Utc::now(),
                events,
            )
        })
        .unwrap_or(Applied::Disposed)
    }

    pub(crate) fn begin_control(
        &self,
        desired_value: bool,
    ) -> Result<ControlRequest, ControlRejection> {
        self.update(|record, _| {
            let id = record.next_request_id;
            let request = apply::begin_control(&mut record.snapshot, id, desired_value, Utc::now())?;
            record.next_request_id += 1;
            Ok(request)
        })
        .unwrap_or(Err(ControlRejection::Disposed))
    }

    pub(crate) fn settle_control(
        &self,
        request_id: u64,
        result: Result<ControlAck, FetchError>,
    ) -> Applied {
        self.update(|record, events| {
            apply::settle_control(&mut record.snapshot, request_id, result, Utc::now(), events)
        })
        .unwrap_or(Applied::Disposed)
    }

    /// Clear the surfaced error. Returns `true` if there was one.
    pub fn dismiss_error(&self) -> bool {
        self.update(|record, _| record.snapshot.last_error.take().is_some())
            .unwrap_or(false)
    }

    /// Stop accepting writes. Returns `true` on the first call only.
    pub fn dispose(&self) -> bool {
        let mut record = self.lock();
        if record.disposed {
            return false;
        }
        record.disposed = true;
        debug!("state store disposed");
        true
    }

    // ── Internals ────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` under the lock, then publish the snapshot if it changed and
    /// broadcast any events. `None` once disposed.
    fn update<R>(&self, f: impl FnOnce(&mut Record, &mut Vec<SessionEvent>) -> R) -> Option<R> {
        let mut record = self.lock();
        if record.disposed {
            return None;
        }
        let before = record.snapshot.clone();
        let mut events = Vec::new();
        let out = f(&mut record, &mut events);

        if record.snapshot != before {
            self.snapshot_tx
                .send_replace(Arc::new(record.snapshot.clone()));
        }
        for event in events {
            // No receivers is fine.
            let _ = self.event_tx.send(event);
        }
        Some(out)
    }
}
