// ── Analog history ──
//
// Single un-paginated read of recent analog samples. Never touches
// session state.

use chrono::Utc;
use tracing::debug;

use crate::decode::decode_history;
use crate::error::{CoreError, FetchError};
use crate::model::AnalogSample;
use crate::transport::Transport;

/// Fetch the most recent `limit` analog samples.
pub async fn fetch_history<T: Transport>(
    transport: &T,
    limit: u32,
) -> Result<Vec<AnalogSample>, CoreError> {
    let limit = limit.max(1);
    let payload = transport
        .fetch_history(limit)
        .await
        .map_err(FetchError::from)?;
    let samples = decode_history(&payload, Utc::now())?;
    debug!(limit, count = samples.len(), "analog history fetched");
    Ok(samples)
}
