// ── Runtime session configuration ──
//
// Describes *where* the gateway is and how often to poll it. Never touches
// disk; `esplink-config` builds one of these from a profile.

use std::time::Duration;

use esplink_api::TransportConfig;
use url::Url;

/// Gateway API root used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://10.1.95.252:5000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Analog samples fetched when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: u32 = 100;

/// Configuration for one device session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Gateway API root, e.g. `http://10.1.95.252:5000/api`.
    pub base_url: Url,
    /// Whole-request timeout for every gateway call.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Period of the background status poll.
    pub poll_interval: Duration,
}

impl SessionConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = self.connect_timeout.min(timeout);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Transport tuning for the HTTP client.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            ..TransportConfig::default()
        }
    }
}
