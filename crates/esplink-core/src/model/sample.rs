// ── Analog input history ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// When a sample was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTime {
    pub at: DateTime<Utc>,
    /// `at` is the receipt time, substituted for a missing or unreadable
    /// timestamp.
    pub approximate: bool,
}

impl RecordTime {
    pub fn exact(at: DateTime<Utc>) -> Self {
        Self {
            at,
            approximate: false,
        }
    }

    pub fn approximate(received_at: DateTime<Utc>) -> Self {
        Self {
            at: received_at,
            approximate: true,
        }
    }
}

/// One reading of the analog input channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogSample {
    pub id: Option<i64>,
    pub value: f64,
    pub recorded_at: RecordTime,
}
