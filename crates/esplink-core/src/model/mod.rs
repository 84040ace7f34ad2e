// ── Device session domain model ──
//
// Every type consumers read lives here: the versioned session snapshot,
// its parts, the event notifications, and read-only analog samples.

pub mod event;
pub mod sample;
pub mod state;

// ── Re-exports ──────────────────────────────────────────────────────

pub use event::SessionEvent;
pub use sample::{AnalogSample, RecordTime};
pub use state::{
    ConnectionState, ControlRequest, DeviceStatus, ErrorKind, OutputState, SessionSnapshot,
    SurfacedError,
};
