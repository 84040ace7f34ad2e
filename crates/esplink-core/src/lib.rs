// esplink-core: Device control and status synchronization.
//
// Sits between the gateway transport and consumers (CLI, UI). Owns one
// versioned state record per device session, keeps it fresh with a
// background poller, and runs optimistic control writes with rollback.

pub mod config;
pub mod control;
pub mod decode;
pub mod error;
pub mod history;
pub mod model;
pub mod poller;
pub mod probe;
pub mod session;
pub mod store;
pub mod stream;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::SessionConfig;
pub use control::ControlCoordinator;
pub use error::{ControlRejection, CoreError, DecodeError, FetchError, TransportError};
pub use history::fetch_history;
pub use poller::{Poller, TickReport};
pub use probe::{ProbeReport, probe};
pub use session::Session;
pub use store::{Applied, StateStore};
pub use stream::SnapshotStream;
pub use transport::Transport;

pub use esplink_api::{DeviceClient, Payload};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AnalogSample, ConnectionState, ControlRequest, DeviceStatus, ErrorKind, OutputState,
    RecordTime, SessionEvent, SessionSnapshot, SurfacedError,
};
