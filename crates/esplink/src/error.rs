//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use esplink_config::ConfigError;
use esplink_core::{ControlRejection, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const REJECTED: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the gateway at {url}")]
    #[diagnostic(
        code(esplink::connection_failed),
        help(
            "{reason}\n\
             Check that the gateway is running and reachable, or pass --server."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(esplink::timeout),
        help("Increase the timeout with --timeout or check gateway responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Control ──────────────────────────────────────────────────────
    #[error("Control rejected: {reason}")]
    #[diagnostic(code(esplink::control_rejected), help("{hint}"))]
    ControlRejected { reason: String, hint: String },

    #[error("Control failed: {message}")]
    #[diagnostic(
        code(esplink::control_failed),
        help("The output was restored to its previous state.")
    )]
    ControlFailed { message: String },

    // ── Gateway responses ────────────────────────────────────────────
    #[error("Gateway reported failure: {message}")]
    #[diagnostic(code(esplink::gateway))]
    Gateway { message: String },

    #[error("Unreadable gateway response: {message}")]
    #[diagnostic(
        code(esplink::decode),
        help("The server answered but not in the expected format. Is --server pointing at the API root?")
    )]
    Decode { message: String },

    #[error("Operation '{operation}' is not supported")]
    #[diagnostic(code(esplink::unsupported))]
    Unsupported { operation: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(esplink::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(esplink::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: esplink config init --name {name} --url <URL>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Profile '{name}' already exists")]
    #[diagnostic(
        code(esplink::profile_exists),
        help("Use --force to overwrite it.")
    )]
    ProfileExists { name: String },

    #[error("Configuration could not be loaded: {message}")]
    #[diagnostic(
        code(esplink::config),
        help("Check the config file at {path}")
    )]
    Config { message: String, path: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(esplink::render))]
    Render(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(esplink::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::ControlRejected { .. } => exit_code::REJECTED,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Core → CliError mapping ──────────────────────────────────────────

impl From<ControlRejection> for CliError {
    fn from(rejection: ControlRejection) -> Self {
        let hint = match rejection {
            ControlRejection::InFlight => "Wait for the previous command to finish.",
            ControlRejection::Disconnected => "Check the gateway with: esplink test",
            ControlRejection::DeviceOffline => {
                "The gateway is up but the device is not running. Check it with: esplink status"
            }
            ControlRejection::OutputUnknown => {
                "The gateway has not reported the output yet. Check it with: esplink status"
            }
            ControlRejection::Disposed => "The session was closed before the command was sent.",
        };
        Self::ControlRejected {
            reason: rejection.to_string(),
            hint: hint.into(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Rejected(rejection) => rejection.into(),
            CoreError::ControlFailed { message } => Self::ControlFailed { message },
            CoreError::Decode(e) => Self::Decode {
                message: e.to_string(),
            },
            CoreError::Application { message } => Self::Gateway { message },
            CoreError::Unsupported { operation } => Self::Unsupported { operation },
            CoreError::Config { message } => Self::Validation {
                field: "server".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
                path: esplink_config::config_path().display().to_string(),
            },
        }
    }
}
