//! `history`: recent analog input samples.

use tabled::Tabled;

use esplink_core::{AnalogSample, SessionConfig};

use crate::cli::{GlobalOpts, HistoryArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Recorded At")]
    recorded_at: String,
}

fn sample_row(s: &AnalogSample) -> SampleRow {
    let at = s.recorded_at.at.format("%Y-%m-%d %H:%M:%S");
    SampleRow {
        id: s.id.map_or_else(|| "-".into(), |id| id.to_string()),
        value: format!("{:.2}", s.value),
        // `~` marks a time we had to guess at.
        recorded_at: if s.recorded_at.approximate {
            format!("~{at}")
        } else {
            at.to_string()
        },
    }
}

pub async fn handle(
    config: SessionConfig,
    args: HistoryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = super::client(&config)?;
    let samples = esplink_core::fetch_history(&client, args.limit).await?;

    let out = output::render_list(global.output, &samples, sample_row, |s| {
        s.value.to_string()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
