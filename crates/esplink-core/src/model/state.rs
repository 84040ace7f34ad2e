// ── Synchronization state types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Link state between us and the gateway, derived from the latest poll.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    /// No poll has completed yet.
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

/// What the gateway reports about itself and the device behind it.
///
/// Written only by the status branch of a poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Gateway's message broker link to the device is up.
    pub transport_linked: bool,
    /// Device reports itself running.
    pub device_running: bool,
    pub last_status_at: Option<DateTime<Utc>>,
}

/// The binary output, with the version guard used to order writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputState {
    pub value: bool,
    /// Bumped on every accepted write. Never decreases.
    pub source_version: u64,
    /// `true` while `value` is an unconfirmed optimistic write.
    pub provisional: bool,
}

impl OutputState {
    /// Whether any write has ever been accepted.
    pub fn is_known(&self) -> bool {
        self.source_version > 0
    }
}

/// An outstanding control command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlRequest {
    pub id: u64,
    pub desired_value: bool,
    /// `source_version` observed when the request was accepted.
    pub issued_version: u64,
    /// `source_version` set by the optimistic write.
    pub optimistic_version: u64,
    /// Value held at `issued_version`; restored on rollback.
    pub prior_value: bool,
    pub in_flight: bool,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Refused connection or I/O fault.
    Transport,
    /// No response within the request timeout.
    Timeout,
    /// Malformed payload.
    Decode,
    /// Gateway reachable but reported a failure.
    Application,
}

impl ErrorKind {
    /// The failure says the link is down rather than the gateway refusing.
    pub fn is_link_failure(self) -> bool {
        matches!(self, Self::Transport | Self::Timeout)
    }
}

/// A user-facing, dismissible error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfacedError {
    pub kind: ErrorKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl SurfacedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            kind,
            message: message.into(),
            at,
        }
    }
}

/// Read-only view of one device session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub connection: ConnectionState,
    pub device: DeviceStatus,
    pub output: OutputState,
    pub control: Option<ControlRequest>,
    pub last_error: Option<SurfacedError>,
}

impl SessionSnapshot {
    /// Connected and the device reports itself running.
    pub fn is_online(&self) -> bool {
        self.connection == ConnectionState::Connected && self.device.device_running
    }

    /// Values shown are last-known-good from before the link dropped.
    pub fn is_stale(&self) -> bool {
        self.connection == ConnectionState::Disconnected && self.output.is_known()
    }

    /// A control submitted now would be accepted, barring disposal.
    pub fn can_control(&self) -> bool {
        self.is_online() && self.output.is_known() && self.control.is_none()
    }

    /// Equal apart from when the status was last read.
    pub fn same_state(&self, other: &Self) -> bool {
        let mut a = self.device.clone();
        a.last_status_at = other.device.last_status_at;
        a == other.device
            && self.connection == other.connection
            && self.output == other.output
            && self.control == other.control
            && self.last_error == other.last_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_cannot_control() {
        let snap = SessionSnapshot::default();
        assert_eq!(snap.connection, ConnectionState::Unknown);
        assert!(!snap.output.is_known());
        assert!(!snap.can_control());
        assert!(!snap.is_stale());
    }

    #[test]
    fn same_state_ignores_status_timestamp_only() {
        let a = SessionSnapshot::default();
        let mut b = a.clone();
        b.device.last_status_at = Some(Utc::now());
        assert!(a.same_state(&b));

        b.device.device_running = true;
        assert!(!a.same_state(&b));
    }

    #[test]
    fn connection_state_round_trips_through_strings() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "disconnected");
        assert_eq!(
            "connected".parse::<ConnectionState>().ok(),
            Some(ConnectionState::Connected)
        );
    }
}
