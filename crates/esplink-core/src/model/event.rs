// ── Session notifications ──
//
// Broadcast alongside snapshot updates. Control completions are emitted
// exactly once per accepted submission.

use serde::Serialize;

use super::state::{ConnectionState, SurfacedError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    ConnectionChanged {
        from: ConnectionState,
        to: ConnectionState,
    },
    /// The gateway acknowledged a control request and `value` is now
    /// confirmed. `superseded` is set when a poll replaced the optimistic
    /// write while the request was in flight.
    ControlConfirmed {
        request_id: u64,
        value: bool,
        superseded: bool,
    },
    /// A control request failed. `rolled_back` is set when the optimistic
    /// value was reverted.
    ControlFailed {
        request_id: u64,
        error: SurfacedError,
        rolled_back: bool,
    },
}

impl SessionEvent {
    /// The control request this event settles, if any.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            Self::ControlConfirmed { request_id, .. } | Self::ControlFailed { request_id, .. } => {
                Some(*request_id)
            }
            Self::ConnectionChanged { .. } => None,
        }
    }
}
