//! `watch`: keep a session polling and print each change until Ctrl-C.

use std::sync::Arc;

use esplink_core::{DeviceClient, Session, SessionConfig, SessionEvent, SessionSnapshot};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    config: SessionConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let session = Session::connect(config)?;
    let result = run(&session, &args, global).await;
    session.dispose().await;
    result
}

async fn run(
    session: &Session<DeviceClient>,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let mut stream = session.subscribe();
    let mut events = session.events();
    session.start();

    let mut printed = 0_u64;
    let mut last: Option<Arc<SessionSnapshot>> = None;
    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            event = events.recv() => match event {
                Ok(SessionEvent::ConnectionChanged { from, to }) => {
                    info!(%from, %to, "connection changed");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
            snap = stream.changed() => {
                let Some(snap) = snap else { break };
                // A fresh status timestamp alone is not worth a line.
                if last.as_ref().is_some_and(|prev| prev.same_state(&snap)) {
                    continue;
                }
                output::print_output(&render_line(global.output, &snap, color)?, global.quiet);
                last = Some(snap);
                printed += 1;
                if args.count.is_some_and(|n| printed >= n) {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// One record per change: a summary line, a JSON line, or a YAML document.
fn render_line(
    format: OutputFormat,
    snap: &SessionSnapshot,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(output::snapshot_line(snap, color)),
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(snap, true),
        OutputFormat::Yaml => Ok(format!("---\n{}", output::render_yaml(snap)?)),
        OutputFormat::Plain => Ok(output::snapshot_plain(snap)),
    }
}
