//! BLINK Protocol - Transport Layer
//!
//! This module implements everything between a logical message and the
//! 20-byte frames the radio link can move atomically:
//!
//! - **Frame codec**: [`encode_header`]/[`decode_header`] and [`fragment`]
//! - **Reassembly**: [`Reassembler`], the single-slot fragment accumulator
//! - **Adapter seam**: [`BleAdapter`]/[`BlePeer`], the interface the core
//!   needs from the low-level radio collaborator
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            Link Layer                   │
//! │   state machine, handshake, pipeline    │
//! ├─────────────────────────────────────────┤
//! │         Transport Layer                 │  ← This module
//! │   framing, reassembly, adapter seam     │
//! ├─────────────────────────────────────────┤
//! │         BLE GATT (external)             │
//! └─────────────────────────────────────────┘
//! ```

mod adapter;
mod frame;
mod reassembly;

pub use adapter::*;
pub use frame::*;
pub use reassembly::*;
