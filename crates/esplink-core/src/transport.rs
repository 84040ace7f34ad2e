// ── Transport capability ──
//
// The only thing the core needs from the network: named requests that
// resolve to a raw payload or a failure. Implemented for the gateway HTTP
// client here; tests plug in scripted transports.

use std::future::Future;

use esplink_api::{DeviceClient, Payload};

use crate::error::TransportError;

/// Asynchronous request capability consumed by the poller and control
/// coordinator.
///
/// Calls carry no ordering guarantee relative to each other.
pub trait Transport: Send + Sync + 'static {
    fn fetch_status(&self) -> impl Future<Output = Result<Payload, TransportError>> + Send;

    fn fetch_output_value(&self) -> impl Future<Output = Result<Payload, TransportError>> + Send;

    fn send_control(
        &self,
        desired_value: bool,
    ) -> impl Future<Output = Result<Payload, TransportError>> + Send;

    /// Most recent analog samples. Only used by the read-only history path.
    fn fetch_history(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Payload, TransportError>> + Send {
        let _ = limit;
        async { Err(TransportError::Unsupported("analog history")) }
    }
}

impl Transport for DeviceClient {
    async fn fetch_status(&self) -> Result<Payload, TransportError> {
        Ok(self.system_status().await?)
    }

    async fn fetch_output_value(&self) -> Result<Payload, TransportError> {
        Ok(self.output_state().await?)
    }

    async fn send_control(&self, desired_value: bool) -> Result<Payload, TransportError> {
        Ok(self.set_output(desired_value).await?)
    }

    async fn fetch_history(&self, limit: u32) -> Result<Payload, TransportError> {
        Ok(self.analog_history(limit).await?)
    }
}
