// esplink-api: Async HTTP client for the ESP32 device gateway.
//
// Thin transport layer. Every HTTP response, successful or not, is handed
// back as a raw `Payload`; envelope decoding belongs to `esplink-core`.

pub mod client;
pub mod error;
pub mod payload;
pub mod transport;

pub use client::DeviceClient;
pub use error::Error;
pub use payload::Payload;
pub use transport::TransportConfig;
