//! `test`: probe the gateway once and report.

use serde::Serialize;

use esplink_core::{ProbeReport, SessionConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Probe result plus the gateway's own liveness endpoint.
#[derive(Serialize)]
struct ProbeView {
    url: String,
    liveness: bool,
    #[serde(flatten)]
    report: ProbeReport,
}

fn detail(view: &ProbeView, color: bool) -> String {
    let r = &view.report;
    let mut lines = vec![
        format!("Server:       {}", view.url),
        format!(
            "Liveness:     {}",
            if view.liveness { "ok" } else { "no answer" }
        ),
        format!("Connection:   {}", output::connection_label(r.connection, color)),
        format!("Round trip:   {} ms", r.round_trip.as_millis()),
    ];
    if r.reachable {
        lines.push(format!(
            "Gateway link: {}",
            if r.device.transport_linked { "up" } else { "down" }
        ));
        lines.push(format!(
            "Device:       {}",
            if r.device.device_running { "running" } else { "stopped" }
        ));
        lines.push(format!("Output:       {}", output::output_label(&r.output, color)));
    }
    if let Some(ref err) = r.error {
        lines.push(format!("Error:        {}", err.message));
    }
    lines.join("\n")
}

pub async fn handle(config: SessionConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let client = super::client(&config)?;
    let liveness = client.ping().await.is_ok_and(|p| p.is_success());
    let report = esplink_core::probe(client).await;

    let view = ProbeView {
        url: config.base_url.to_string(),
        liveness,
        report,
    };
    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &view,
        |v| detail(v, color),
        |v| (if v.report.reachable { "ok" } else { "unreachable" }).to_owned(),
    )?;
    output::print_output(&out, global.quiet);

    if view.report.reachable {
        Ok(())
    } else {
        let snap = esplink_core::SessionSnapshot {
            connection: view.report.connection,
            last_error: view.report.error,
            ..Default::default()
        };
        super::ensure_connected(&snap, &config)
    }
}
