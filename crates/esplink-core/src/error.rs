// ── Core error types ──
//
// Transport, decode and application failures are values flowing through
// the poll and control paths; none of them is fatal to a session.
// `CoreError` is what one-shot operations hand back to consumers.

use thiserror::Error;

use crate::model::ErrorKind;

/// The request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("cannot reach {url}: {reason}")]
    ConnectionRefused { url: String, reason: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0} is not supported by this transport")]
    Unsupported(&'static str),
}

/// A response arrived but could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("malformed {what} payload: {message}")]
    Malformed { what: &'static str, message: String },

    #[error("{0} response carries no data")]
    MissingData(&'static str),
}

/// Why a single fetch produced no usable value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The gateway answered and reported a failure.
    #[error("gateway reported failure: {reason}")]
    Application { reason: String },
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(TransportError::Timeout { .. }) => ErrorKind::Timeout,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Application { .. } => ErrorKind::Application,
        }
    }
}

/// Synchronous refusal of a control submission. Nothing is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlRejection {
    #[error("another control request is still in flight")]
    InFlight,

    #[error("gateway is not connected")]
    Disconnected,

    #[error("device is not running")]
    DeviceOffline,

    #[error("output state has not been read yet")]
    OutputUnknown,

    #[error("session has been disposed")]
    Disposed,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to gateway at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Gateway request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Control errors ───────────────────────────────────────────────
    #[error("Control rejected: {0}")]
    Rejected(#[from] ControlRejection),

    #[error("Control failed: {message}")]
    ControlFailed { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Gateway reported failure: {message}")]
    Application { message: String },

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<esplink_api::Error> for TransportError {
    fn from(err: esplink_api::Error) -> Self {
        match err {
            esplink_api::Error::Timeout { timeout_secs } => Self::Timeout { timeout_secs },
            esplink_api::Error::Transport(ref e) if e.is_timeout() => {
                Self::Timeout { timeout_secs: 0 }
            }
            esplink_api::Error::Transport(ref e) if e.is_connect() => Self::ConnectionRefused {
                url: e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string),
                reason: e.to_string(),
            },
            esplink_api::Error::Transport(e) => Self::Io(e.to_string()),
            esplink_api::Error::InvalidUrl(e) => Self::Io(format!("invalid URL: {e}")),
            esplink_api::Error::ClientBuild(msg) => Self::Io(msg),
        }
    }
}

impl From<TransportError> for CoreError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { timeout_secs } => Self::Timeout { timeout_secs },
            TransportError::ConnectionRefused { url, reason } => {
                Self::ConnectionFailed { url, reason }
            }
            TransportError::Io(reason) => Self::ConnectionFailed {
                url: String::new(),
                reason,
            },
            TransportError::Unsupported(operation) => Self::Unsupported {
                operation: operation.into(),
            },
        }
    }
}

impl From<FetchError> for CoreError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Transport(e) => e.into(),
            FetchError::Decode(e) => Self::Decode(e),
            FetchError::Application { reason } => Self::Application { message: reason },
        }
    }
}

impl From<esplink_api::Error> for CoreError {
    fn from(err: esplink_api::Error) -> Self {
        match err {
            esplink_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            esplink_api::Error::ClientBuild(message) => Self::Config { message },
            other => TransportError::from(other).into(),
        }
    }
}
