//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Lists use `tabled`,
//! single items a key/value detail view, structured formats use serde, and
//! plain emits one value per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use esplink_core::{ConnectionState, OutputState, SessionSnapshot};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// `ON` / `OFF` / `unknown`, with a marker for unconfirmed values.
pub fn output_label(output: &OutputState, color: bool) -> String {
    let text = match (output.is_known(), output.value) {
        (false, _) => "unknown".to_owned(),
        (true, true) => "ON".to_owned(),
        (true, false) => "OFF".to_owned(),
    };
    let text = if output.provisional {
        format!("{text} (pending)")
    } else {
        text
    };
    if !color {
        return text;
    }
    match (output.is_known(), output.value) {
        (false, _) => text.dimmed().to_string(),
        (true, true) => text.green().bold().to_string(),
        (true, false) => text.yellow().to_string(),
    }
}

pub fn connection_label(state: ConnectionState, color: bool) -> String {
    let text = state.to_string();
    if !color {
        return text;
    }
    match state {
        ConnectionState::Connected => text.green().to_string(),
        ConnectionState::Disconnected => text.red().bold().to_string(),
        ConnectionState::Unknown => text.dimmed().to_string(),
    }
}

fn yes_no(flag: bool, yes: &str, no: &str) -> String {
    (if flag { yes } else { no }).to_owned()
}

/// Key/value detail view of a session snapshot.
pub fn snapshot_detail(snap: &SessionSnapshot, color: bool) -> String {
    let mut lines = vec![
        format!("Connection:   {}", connection_label(snap.connection, color)),
        format!(
            "Gateway link: {}",
            yes_no(snap.device.transport_linked, "up", "down")
        ),
        format!(
            "Device:       {}",
            yes_no(snap.device.device_running, "running", "stopped")
        ),
        format!("Output:       {}", output_label(&snap.output, color)),
        format!(
            "Last status:  {}",
            snap.device
                .last_status_at
                .map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        ),
    ];
    if let Some(ref err) = snap.last_error {
        let message = format!("{} ({})", err.message, err.kind);
        let message = if color {
            message.red().to_string()
        } else {
            message
        };
        lines.push(format!("Last error:   {message}"));
    }
    lines.join("\n")
}

/// One-line summary used by `watch`.
pub fn snapshot_line(snap: &SessionSnapshot, color: bool) -> String {
    format!(
        "{}  {:<12}  link={:<4}  device={:<7}  output={}",
        chrono::Utc::now().format("%H:%M:%S"),
        connection_label(snap.connection, color),
        yes_no(snap.device.transport_linked, "up", "down"),
        yes_no(snap.device.device_running, "running", "stopped"),
        output_label(&snap.output, color),
    )
}

/// Output value for scripting: `on`, `off`, or `unknown`.
pub fn snapshot_plain(snap: &SessionSnapshot) -> String {
    if !snap.output.is_known() {
        "unknown".into()
    } else if snap.output.value {
        "on".into()
    } else {
        "off".into()
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&plain_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(plain_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub(crate) fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Render(e.to_string()))
}

pub(crate) fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Render(e.to_string()))
}
