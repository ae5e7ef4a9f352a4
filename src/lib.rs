//! # BLINK Protocol
//!
//! **B**luetooth **Link** - a reliable, authenticated message channel over a
//! BLE GATT link.
//!
//! BLINK turns an unreliable, MTU-constrained low-energy radio transport into
//! an arbitrarily-sized message channel between a host and a single paired
//! peripheral. It provides:
//!
//! - **Framing**: transparent fragmentation and reassembly across 20-byte
//!   transport frames
//! - **Security**: XChaCha20-Poly1305 authenticated encryption with strict
//!   per-direction nonce bookkeeping
//! - **Resilience**: a jittered-backoff handshake sequencer for flaky GATT
//!   discovery steps
//! - **Simplicity**: a single connection, a fixed cryptographic suite, no
//!   negotiation
//!
//! The low-level radio is an external collaborator: callers plug in any
//! [`transport::BleAdapter`] implementation (btleplug, bluer, a mock) and the
//! crate drives the rest.
//!
//! ## Modules
//!
//! - [`core`]: constants and error types
//! - [`transport`]: frame codec, reassembler, and the radio adapter seam
//! - [`crypto`]: the encrypted-session layer
//! - [`link`]: connection state machine, handshake sequencer, and the
//!   session pipeline
//!
//! ## Example Usage
//!
//! ```ignore
//! use blink_protocol::prelude::*;
//!
//! let keys = SessionKeys::new(send_key, recv_key);
//! let (link, mut messages) = BleLink::new(adapter, keys, LinkConfig::default());
//!
//! let devices = link.scan().await?;
//! link.connect(devices[0].id).await?;
//! link.send(b"hello").await?;
//!
//! while let Some(message) = messages.recv().await {
//!     // handle inbound message
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod core;

pub mod crypto;

pub mod link;

pub mod transport;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::*;

    pub use crate::crypto::{CryptoSession, Nonce, SessionKey, SessionKeys};

    pub use crate::link::{
        BleLink, Device, DeviceId, LinkConfig, LinkConfigBuilder, MessageReceiver, ScanRegistry,
        retry,
    };

    pub use crate::transport::{
        Advertisement, BleAdapter, BlePeer, ConnectionParams, FrameKind, PeerAddress, Reassembler,
        decode_header, encode_header, fragment,
    };
}

// Re-export commonly used items at crate root
pub use crate::core::{CryptoError, LinkError, TransportError};

pub use crypto::{CryptoSession, SessionKey, SessionKeys};
pub use link::{BleLink, Device, DeviceId, LinkConfig, MessageReceiver};
pub use transport::{BleAdapter, BlePeer, FrameKind, Reassembler};
