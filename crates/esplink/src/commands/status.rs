//! `status`: one poll, print the snapshot.

use esplink_core::{Session, SessionConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(config: SessionConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let session = Session::connect(config.clone())?;
    session.refresh().await;
    let snap = session.snapshot();
    session.dispose().await;

    super::ensure_connected(&snap, &config)?;

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
