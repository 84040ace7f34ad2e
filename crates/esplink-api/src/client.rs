// Device gateway HTTP client
//
// Wraps `reqwest::Client` with gateway URL construction and response
// capture. Each endpoint returns the raw `Payload`; nothing here inspects
// the `{ success, data, error }` envelope.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::payload::Payload;
use crate::transport::TransportConfig;

/// HTTP client for the ESP32 gateway's REST API.
///
/// `base_url` points at the API root, e.g. `http://10.1.95.252:5000/api`.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl DeviceClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: transport.timeout,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout: TransportConfig::default().timeout,
        }
    }

    /// The gateway API root.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{path}`, tolerating a trailing slash on the base.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get(&self, url: Url) -> Result<Payload, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await.map_err(|e| self.classify(e))?;
        self.read_payload(resp).await
    }

    async fn post(&self, url: Url, body: &impl Serialize) -> Result<Payload, Error> {
        debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        self.read_payload(resp).await
    }

    async fn read_payload(&self, resp: reqwest::Response) -> Result<Payload, Error> {
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| self.classify(e))?;
        debug!(status, bytes = body.len(), "response received");
        Ok(Payload::new(status, body))
    }

    fn classify(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET status`: gateway link and device run state.
    pub async fn system_status(&self) -> Result<Payload, Error> {
        self.get(self.endpoint("status")?).await
    }

    /// `GET io1/current`: current value of the binary output.
    pub async fn output_state(&self) -> Result<Payload, Error> {
        self.get(self.endpoint("io1/current")?).await
    }

    /// `POST io1/control`: drive the binary output.
    pub async fn set_output(&self, state: bool) -> Result<Payload, Error> {
        let body = serde_json::json!({ "state": state });
        self.post(self.endpoint("io1/control")?, &body).await
    }

    /// `GET ad1/data?limit=N`: most recent analog samples.
    pub async fn analog_history(&self, limit: u32) -> Result<Payload, Error> {
        let mut url = self.endpoint("ad1/data")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        self.get(url).await
    }

    /// `GET test`: liveness check.
    pub async fn ping(&self) -> Result<Payload, Error> {
        self.get(self.endpoint("test")?).await
    }
}
