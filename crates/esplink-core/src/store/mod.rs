// ── Synchronization state ──
//
// The single owned, versioned record of a device session. Pollers and the
// control coordinator propose updates; `StateStore` applies them one at a
// time under the version guard and notifies subscribers.

mod apply;
mod state_store;

pub use apply::Applied;
pub use state_store::StateStore;
