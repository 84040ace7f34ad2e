// ── Response decoder ──
//
// Turns a raw gateway `Payload` into exactly one typed result. Every
// failure is a value: malformed input yields `DecodeError`, an envelope
// with `success: false` yields `FetchError::Application`. Nothing here
// panics on bad input.

mod timestamp;

use chrono::{DateTime, Utc};
use esplink_api::Payload;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DecodeError, FetchError};
use crate::model::AnalogSample;

pub use timestamp::parse_record_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub linked: bool,
    pub running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSnapshot {
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlAck {
    pub accepted: bool,
    pub reason: Option<String>,
}

// ── Wire shapes ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl Envelope {
    fn failure_reason(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "request failed".into())
    }
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    mqtt_connected: bool,
    system_status: String,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    state: bool,
}

/// A history row: either an object or a `[value, timestamp]` pair.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSample {
    Object {
        #[serde(default)]
        id: Option<i64>,
        value: f64,
        #[serde(default)]
        timestamp: Option<Value>,
    },
    Pair(f64, Option<Value>),
}

// ── Envelope handling ────────────────────────────────────────────────

fn read_envelope(payload: &Payload) -> Result<Envelope, FetchError> {
    match serde_json::from_str::<Envelope>(payload.body()) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !payload.is_success() => Err(http_failure(payload)),
        Err(e) => Err(DecodeError::InvalidJson(e.to_string()).into()),
    }
}

fn http_failure(payload: &Payload) -> FetchError {
    FetchError::Application {
        reason: format!("HTTP {}", payload.status()),
    }
}

/// Unwrap a successful read envelope down to its typed `data`.
fn read_data<T: DeserializeOwned>(payload: &Payload, what: &'static str) -> Result<T, FetchError> {
    let envelope = read_envelope(payload)?;
    if !envelope.success {
        return Err(FetchError::Application {
            reason: envelope.failure_reason(),
        });
    }
    if !payload.is_success() {
        return Err(http_failure(payload));
    }
    let data = envelope.data.ok_or(DecodeError::MissingData(what))?;
    serde_json::from_value(data).map_err(|e| {
        DecodeError::Malformed {
            what,
            message: e.to_string(),
        }
        .into()
    })
}

// ── Decoders ─────────────────────────────────────────────────────────

pub fn decode_status(payload: &Payload) -> Result<StatusSnapshot, FetchError> {
    let raw: RawStatus = read_data(payload, "status")?;
    Ok(StatusSnapshot {
        linked: raw.mqtt_connected,
        running: is_running(&raw.system_status),
    })
}

pub fn decode_output(payload: &Payload) -> Result<OutputSnapshot, FetchError> {
    let raw: RawOutput = read_data(payload, "output")?;
    Ok(OutputSnapshot { value: raw.state })
}

/// A negative acknowledgement is `Ok` with `accepted: false`; only an
/// unreadable response is an error.
pub fn decode_control_ack(payload: &Payload) -> Result<ControlAck, FetchError> {
    let envelope = read_envelope(payload)?;
    if !envelope.success {
        return Ok(ControlAck {
            accepted: false,
            reason: Some(envelope.failure_reason()),
        });
    }
    if !payload.is_success() {
        return Ok(ControlAck {
            accepted: false,
            reason: Some(format!("HTTP {}", payload.status())),
        });
    }
    Ok(ControlAck {
        accepted: true,
        reason: None,
    })
}

/// Decode analog history. Unreadable timestamps fall back to `received_at`.
pub fn decode_history(
    payload: &Payload,
    received_at: DateTime<Utc>,
) -> Result<Vec<AnalogSample>, FetchError> {
    let rows: Vec<RawSample> = read_data(payload, "history")?;
    Ok(rows
        .into_iter()
        .map(|row| match row {
            RawSample::Object {
                id,
                value,
                timestamp,
            } => AnalogSample {
                id,
                value,
                recorded_at: parse_record_time(timestamp.as_ref(), received_at),
            },
            RawSample::Pair(value, timestamp) => AnalogSample {
                id: None,
                value,
                recorded_at: parse_record_time(timestamp.as_ref(), received_at),
            },
        })
        .collect())
}

/// The gateway reports `"running"` or its localized form.
fn is_running(system_status: &str) -> bool {
    let status = system_status.trim();
    status.eq_ignore_ascii_case("running") || status == "运行中"
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::ErrorKind;

    fn ok(body: &Value) -> Payload {
        Payload::ok(body.to_string())
    }

    #[test]
    fn status_running_and_linked() {
        let payload = ok(&json!({
            "success": true,
            "data": { "mqtt_connected": true, "system_status": "running", "io1_current_state": false }
        }));
        assert_eq!(
            decode_status(&payload).unwrap(),
            StatusSnapshot {
                linked: true,
                running: true
            }
        );
    }

    #[test]
    fn status_accepts_localized_running() {
        let payload = ok(&json!({
            "success": true,
            "data": { "mqtt_connected": false, "system_status": "运行中" }
        }));
        let status = decode_status(&payload).unwrap();
        assert!(status.running);
        assert!(!status.linked);
    }

    #[test]
    fn status_other_text_is_not_running() {
        let payload = ok(&json!({
            "success": true,
            "data": { "mqtt_connected": true, "system_status": "stopped" }
        }));
        assert!(!decode_status(&payload).unwrap().running);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode_status(&Payload::ok("<html>oops")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn missing_data_is_a_decode_error() {
        let err = decode_output(&ok(&json!({ "success": true }))).unwrap_err();
        assert_eq!(err, FetchError::Decode(DecodeError::MissingData("output")));
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        let err = decode_output(&ok(&json!({ "success": true, "data": { "state": "on" } })))
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::Decode(DecodeError::Malformed { what: "output", .. })
        ));
    }

    #[test]
    fn success_false_on_read_is_application_error() {
        let err = decode_output(&ok(&json!({ "success": false, "error": "device busy" })))
            .unwrap_err();
        assert_eq!(
            err,
            FetchError::Application {
                reason: "device busy".into()
            }
        );
    }

    #[test]
    fn non_envelope_http_error_carries_status() {
        let err = decode_status(&Payload::new(502, "Bad Gateway")).unwrap_err();
        assert_eq!(
            err,
            FetchError::Application {
                reason: "HTTP 502".into()
            }
        );
    }

    #[test]
    fn control_ack_positive() {
        let ack = decode_control_ack(&ok(&json!({ "success": true, "message": "IO1 ON" }))).unwrap();
        assert!(ack.accepted);
        assert_eq!(ack.reason, None);
    }

    #[test]
    fn control_ack_negative_with_server_error() {
        let payload = Payload::new(
            500,
            json!({ "success": false, "error": "MQTT not connected" }).to_string(),
        );
        let ack = decode_control_ack(&payload).unwrap();
        assert!(!ack.accepted);
        assert_eq!(ack.reason.as_deref(), Some("MQTT not connected"));
    }

    #[test]
    fn control_ack_garbage_is_decode_error() {
        assert!(matches!(
            decode_control_ack(&Payload::ok("")),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn output_reads_state() {
        let payload = ok(&json!({ "success": true, "data": { "state": true } }));
        assert_eq!(
            decode_output(&payload).unwrap(),
            OutputSnapshot { value: true }
        );
    }

    #[test]
    fn history_accepts_objects_and_pairs() {
        let received = Utc::now();
        let payload = ok(&json!({
            "success": true,
            "data": [
                { "id": 7, "value": 512, "timestamp": 1_700_000_000 },
                [300, "2024-03-01 12:00:00"],
                { "value": 1.5, "timestamp": "yesterday-ish" }
            ]
        }));
        let samples = decode_history(&payload, received).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].id, Some(7));
        assert!((samples[0].value - 512.0).abs() < f64::EPSILON);
        assert!(!samples[0].recorded_at.approximate);
        assert!(!samples[1].recorded_at.approximate);
        assert!(samples[2].recorded_at.approximate);
        assert_eq!(samples[2].recorded_at.at, received);
    }
}
