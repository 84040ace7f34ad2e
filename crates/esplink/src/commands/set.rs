//! `set`: switch the output and wait for the gateway's answer.

use std::sync::Arc;
use std::time::Duration;

use esplink_core::{DeviceClient, Session, SessionConfig, SessionEvent, SessionSnapshot};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tracing::debug;

use crate::cli::{GlobalOpts, SetArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    config: SessionConfig,
    args: SetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let session = Session::connect(config.clone())?;
    let result = run(&session, &config, args.state.as_bool(), args.wait).await;
    session.dispose().await;
    let snap = result?;

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        snap.as_ref(),
        |s| output::snapshot_detail(s, color),
        output::snapshot_plain,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn run(
    session: &Session<DeviceClient>,
    config: &SessionConfig,
    desired: bool,
    wait: Duration,
) -> Result<Arc<SessionSnapshot>, CliError> {
    // Poll until the device is controllable or another poll would pass
    // the deadline. The submit below reports why if it never was.
    let ready_by = Instant::now() + wait;
    loop {
        session.refresh().await;
        if session.snapshot().can_control()
            || Instant::now() + config.poll_interval >= ready_by
        {
            break;
        }
        debug!("device not ready, polling again");
        tokio::time::sleep(config.poll_interval).await;
    }
    super::ensure_connected(&session.snapshot(), config)?;

    let mut events = session.events();
    let request = session.submit_control(desired)?;
    debug!(request_id = request.id, desired, "waiting for acknowledgement");
    let deadline = Instant::now() + wait;

    loop {
        let event = tokio::time::timeout_at(deadline, events.recv())
            .await
            .map_err(|_| CliError::Timeout {
                seconds: wait.as_secs(),
            })?;
        match event {
            Ok(event) if event.request_id() != Some(request.id) => {}
            Ok(SessionEvent::ControlConfirmed { superseded, .. }) => {
                if superseded {
                    debug!("a poll read the old value before the acknowledgement");
                }
                return Ok(session.snapshot());
            }
            Ok(SessionEvent::ControlFailed { error, .. }) => {
                return Err(CliError::ControlFailed {
                    message: error.message,
                });
            }
            Ok(SessionEvent::ConnectionChanged { .. }) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => {
                return Err(CliError::Internal("session closed while waiting".into()));
            }
        }
    }
}
