//! BLINK Protocol - Link Layer
//!
//! The stateful heart of the crate:
//!
//! - [`LinkStateMachine`]: the connection lifecycle and inbound dispatch rule
//! - [`retry`]: the jittered-backoff helper wrapping flaky discovery steps
//! - [`ScanRegistry`]: deduplicated scan results with stable identifiers
//! - [`BleLink`]: the handshake sequencer and session pipeline

mod connection;
mod retry;
mod scan;
mod state;

pub use connection::*;
pub use retry::retry;
pub use scan::*;
pub use state::*;
