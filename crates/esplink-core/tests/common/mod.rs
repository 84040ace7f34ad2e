// Scripted in-memory transport for driving sessions in tests.

#![allow(clippy::unwrap_used, dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use esplink_core::{Payload, SessionConfig, Transport, TransportError};
use serde_json::json;
use tokio::sync::oneshot;
use url::Url;

pub type Outcome = Result<Payload, TransportError>;

/// One scripted reply.
pub enum Reply {
    Ready(Outcome),
    Delayed(Duration, Outcome),
    /// Resolves when the test sends on the paired `oneshot::Sender`.
    Deferred(oneshot::Receiver<Outcome>),
}

impl Reply {
    pub fn deferred() -> (oneshot::Sender<Outcome>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self::Deferred(rx))
    }
}

/// A scripted endpoint: queued replies first, then the fallback.
pub struct Endpoint {
    queue: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Outcome>,
    latency: Mutex<Duration>,
    calls: AtomicUsize,
}

impl Endpoint {
    fn new(fallback: Outcome) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
            latency: Mutex::new(Duration::ZERO),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, reply: Reply) {
        self.queue.lock().unwrap().push_back(reply);
    }

    pub fn set_fallback(&self, outcome: Outcome) {
        *self.fallback.lock().unwrap() = outcome;
    }

    /// Delay applied to fallback replies.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> impl Future<Output = Outcome> + Send + 'static {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.queue.lock().unwrap().pop_front().unwrap_or_else(|| {
            let outcome = self.fallback.lock().unwrap().clone();
            let latency = *self.latency.lock().unwrap();
            if latency.is_zero() {
                Reply::Ready(outcome)
            } else {
                Reply::Delayed(latency, outcome)
            }
        });
        async move {
            match reply {
                Reply::Ready(outcome) => outcome,
                Reply::Delayed(delay, outcome) => {
                    tokio::time::sleep(delay).await;
                    outcome
                }
                Reply::Deferred(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(TransportError::Io("reply dropped".into()))),
            }
        }
    }
}

pub struct Endpoints {
    pub status: Endpoint,
    pub output: Endpoint,
    pub control: Endpoint,
    pub history: Endpoint,
}

/// Cloneable handle; clones share the same script.
#[derive(Clone)]
pub struct ScriptedTransport(Arc<Endpoints>);

impl std::ops::Deref for ScriptedTransport {
    type Target = Endpoints;

    fn deref(&self) -> &Endpoints {
        &self.0
    }
}

impl ScriptedTransport {
    /// Gateway up, device running, output off, every control accepted.
    pub fn online() -> Self {
        Self(Arc::new(Endpoints {
            status: Endpoint::new(Ok(status_payload(true, true))),
            output: Endpoint::new(Ok(output_payload(false))),
            control: Endpoint::new(Ok(ack_payload())),
            history: Endpoint::new(Ok(Payload::ok(
                json!({ "success": true, "data": [] }).to_string(),
            ))),
        }))
    }
}

impl Transport for ScriptedTransport {
    fn fetch_status(&self) -> impl Future<Output = Outcome> + Send {
        self.status.next()
    }

    fn fetch_output_value(&self) -> impl Future<Output = Outcome> + Send {
        self.output.next()
    }

    fn send_control(&self, _desired_value: bool) -> impl Future<Output = Outcome> + Send {
        self.control.next()
    }

    fn fetch_history(&self, _limit: u32) -> impl Future<Output = Outcome> + Send {
        self.history.next()
    }
}

// ── Payload builders ────────────────────────────────────────────────

pub fn status_payload(linked: bool, running: bool) -> Payload {
    let system_status = if running { "running" } else { "stopped" };
    Payload::ok(
        json!({
            "success": true,
            "data": { "mqtt_connected": linked, "system_status": system_status }
        })
        .to_string(),
    )
}

pub fn output_payload(value: bool) -> Payload {
    Payload::ok(json!({ "success": true, "data": { "state": value } }).to_string())
}

pub fn ack_payload() -> Payload {
    Payload::ok(json!({ "success": true, "message": "ok" }).to_string())
}

pub fn nack_payload(reason: &str) -> Payload {
    Payload::new(500, json!({ "success": false, "error": reason }).to_string())
}

pub fn unreachable() -> TransportError {
    TransportError::ConnectionRefused {
        url: "http://device.test/api/status".into(),
        reason: "connection refused".into(),
    }
}

pub fn config() -> SessionConfig {
    SessionConfig::new(Url::parse("http://device.test/api").unwrap())
        .with_poll_interval(Duration::from_secs(5))
}
