//! Command dispatch: bridges CLI args -> core session -> output formatting.

pub mod config_cmd;
pub mod history;
pub mod probe;
pub mod set;
pub mod status;
pub mod watch;

use esplink_core::{ConnectionState, CoreError, DeviceClient, ErrorKind, SessionConfig, SessionSnapshot};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a gateway-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: SessionConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(config, global).await,
        Command::Watch(args) => watch::handle(config, args, global).await,
        Command::Set(args) => set::handle(config, args, global).await,
        Command::Test => probe::handle(config, global).await,
        Command::History(args) => history::handle(config, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are handled before dispatch".into(),
        )),
    }
}

/// Build the gateway HTTP client for one-shot reads.
pub(crate) fn client(config: &SessionConfig) -> Result<DeviceClient, CliError> {
    DeviceClient::new(config.base_url.clone(), &config.transport())
        .map_err(|e| CoreError::from(e).into())
}

/// Turn a disconnected snapshot into the error explaining why.
pub(crate) fn ensure_connected(
    snap: &SessionSnapshot,
    config: &SessionConfig,
) -> Result<(), CliError> {
    if snap.connection == ConnectionState::Connected {
        return Ok(());
    }
    match snap.last_error {
        Some(ref err) if err.kind == ErrorKind::Timeout => Err(CliError::Timeout {
            seconds: config.timeout.as_secs(),
        }),
        ref other => Err(CliError::ConnectionFailed {
            url: config.base_url.to_string(),
            reason: other
                .as_ref()
                .map_or_else(|| "no usable response from gateway".into(), |e| e.message.clone()),
        }),
    }
}
