// Write rules for proposed updates.
//
// Pure functions over a `SessionSnapshot`. The store calls them under its
// lock; events they push are broadcast after the snapshot is published.

use chrono::{DateTime, Utc};

use crate::decode::{ControlAck, OutputSnapshot, StatusSnapshot};
use crate::error::{ControlRejection, FetchError};
use crate::model::{
    ConnectionState, ControlRequest, ErrorKind, SessionEvent, SessionSnapshot, SurfacedError,
};

/// Result of proposing an update to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// State changed and subscribers were notified.
    Updated,
    /// Accepted, but nothing differed from what was stored.
    NoChange,
    /// Older than the stored value; discarded.
    Stale,
    /// The session is gone; discarded.
    Disposed,
}

fn outcome(changed: bool) -> Applied {
    if changed {
        Applied::Updated
    } else {
        Applied::NoChange
    }
}

fn set_connection(
    snap: &mut SessionSnapshot,
    to: ConnectionState,
    events: &mut Vec<SessionEvent>,
) -> bool {
    let from = snap.connection;
    if from == to {
        return false;
    }
    snap.connection = to;
    events.push(SessionEvent::ConnectionChanged { from, to });
    true
}

/// Record a poll failure. Returns `None` for decode failures, which leave
/// the session untouched.
fn record_poll_failure(
    snap: &mut SessionSnapshot,
    err: &FetchError,
    at: DateTime<Utc>,
    events: &mut Vec<SessionEvent>,
) -> Option<bool> {
    let connection = match err {
        FetchError::Decode(_) => return None,
        FetchError::Transport(_) => ConnectionState::Disconnected,
        FetchError::Application { .. } => ConnectionState::Connected,
    };
    let changed = set_connection(snap, connection, events);
    let error = SurfacedError::new(err.kind(), err.to_string(), at);
    let same_error = snap
        .last_error
        .as_ref()
        .is_some_and(|e| e.kind == error.kind && e.message == error.message);
    if same_error {
        return Some(changed);
    }
    snap.last_error = Some(error);
    Some(true)
}

/// A successful read proves the link is up; clear a link error.
fn record_poll_success(snap: &mut SessionSnapshot, events: &mut Vec<SessionEvent>) -> bool {
    let mut changed = set_connection(snap, ConnectionState::Connected, events);
    if snap
        .last_error
        .as_ref()
        .is_some_and(|e| e.kind.is_link_failure())
    {
        snap.last_error = None;
        changed = true;
    }
    changed
}

pub(crate) fn apply_status(
    snap: &mut SessionSnapshot,
    result: &Result<StatusSnapshot, FetchError>,
    at: DateTime<Utc>,
    events: &mut Vec<SessionEvent>,
) -> Applied {
    let status = match result {
        Ok(status) => status,
        Err(err) => {
            return record_poll_failure(snap, err, at, events).map_or(Applied::NoChange, outcome);
        }
    };
    record_poll_success(snap, events);
    snap.device.transport_linked = status.linked;
    snap.device.device_running = status.running;
    // Refreshing `last_status_at` is itself a change, so every good read
    // publishes.
    snap.device.last_status_at = Some(at);
    Applied::Updated
}

/// `captured` is the output version observed when the fetch was issued.
pub(crate) fn apply_output(
    snap: &mut SessionSnapshot,
    captured: u64,
    result: &Result<OutputSnapshot, FetchError>,
    at: DateTime<Utc>,
    events: &mut Vec<SessionEvent>,
) -> Applied {
    let reading = match result {
        Ok(reading) => reading,
        Err(err) => {
            return record_poll_failure(snap, err, at, events).map_or(Applied::NoChange, outcome);
        }
    };
    let link_changed = record_poll_success(snap, events);
    let output = &mut snap.output;
    if captured < output.source_version {
        return Applied::Stale;
    }
    let differs = output.value != reading.value;
    if output.is_known() && !differs && !output.provisional {
        return outcome(link_changed);
    }
    output.value = reading.value;
    output.provisional = false;
    output.source_version += 1;
    Applied::Updated
}

pub(crate) fn begin_control(
    snap: &mut SessionSnapshot,
    id: u64,
    desired_value: bool,
    at: DateTime<Utc>,
) -> Result<ControlRequest, ControlRejection> {
    if snap.control.is_some() {
        return Err(ControlRejection::InFlight);
    }
    if snap.connection != ConnectionState::Connected {
        return Err(ControlRejection::Disconnected);
    }
    if !snap.device.device_running {
        return Err(ControlRejection::DeviceOffline);
    }
    if !snap.output.is_known() {
        return Err(ControlRejection::OutputUnknown);
    }

    let output = &mut snap.output;
    let issued_version = output.source_version;
    let prior_value = output.value;
    output.value = desired_value;
    output.provisional = true;
    output.source_version += 1;

    let request = ControlRequest {
        id,
        desired_value,
        issued_version,
        optimistic_version: output.source_version,
        prior_value,
        in_flight: true,
        issued_at: at,
    };
    snap.control = Some(request.clone());
    Ok(request)
}

pub(crate) fn settle_control(
    snap: &mut SessionSnapshot,
    request_id: u64,
    result: Result<ControlAck, FetchError>,
    at: DateTime<Utc>,
    events: &mut Vec<SessionEvent>,
) -> Applied {
    let Some(request) = snap.control.take_if(|c| c.id == request_id) else {
        return Applied::Stale;
    };
    let current = snap.output.source_version == request.optimistic_version;

    let failure = match result {
        Ok(ControlAck { accepted: true, .. }) => {
            // The gateway applied the command, so it outranks any read that
            // landed while it was in flight.
            snap.output.value = request.desired_value;
            snap.output.provisional = false;
            snap.output.source_version += 1;
            events.push(SessionEvent::ControlConfirmed {
                request_id,
                value: request.desired_value,
                superseded: !current,
            });
            return Applied::Updated;
        }
        Ok(ControlAck { reason, .. }) => SurfacedError::new(
            ErrorKind::Application,
            reason.unwrap_or_else(|| "control rejected by gateway".into()),
            at,
        ),
        Err(err) => SurfacedError::new(err.kind(), err.to_string(), at),
    };

    if current {
        snap.output.value = request.prior_value;
        snap.output.provisional = false;
        snap.output.source_version += 1;
    }
    snap.last_error = Some(failure.clone());
    events.push(SessionEvent::ControlFailed {
        request_id,
        error: failure,
        rolled_back: current,
    });
    Applied::Updated
}
