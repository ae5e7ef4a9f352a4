//! The radio adapter seam.
//!
//! The link layer never touches a Bluetooth stack directly: it consumes the
//! narrow interface below, which any GATT central implementation (btleplug,
//! bluer, a test mock) can provide. Notification delivery is modeled as a
//! bounded channel hand-off rather than a callback, so the link layer's
//! single consumer task keeps exclusive ownership of reassembly state.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::core::{DEFAULT_CONNECTION_TIMEOUT, TransportError};

/// An opaque peer address in the platform's native form (a MAC address on
/// Linux, a device identifier on macOS).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PeerAddress(String);

impl PeerAddress {
    /// Wrap a platform address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The address in its platform string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One advertisement observed during a scan.
#[derive(Clone, Debug)]
pub struct Advertisement {
    /// The advertising peer's address.
    pub address: PeerAddress,
    /// The advertised local name, if any.
    pub local_name: String,
    /// Advertised service UUIDs (short UUIDs expanded to 128-bit form).
    pub services: Vec<Uuid>,
}

/// Transport-level connection parameters.
#[derive(Clone, Debug)]
pub struct ConnectionParams {
    /// Transport-level connection timeout.
    pub timeout: Duration,
    /// Minimum connection interval, in transport units (0 = adapter default).
    pub min_interval: u16,
    /// Maximum connection interval, in transport units (0 = adapter default).
    pub max_interval: u16,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CONNECTION_TIMEOUT,
            min_interval: 0,
            max_interval: 0,
        }
    }
}

/// A GATT central adapter: device discovery and connection establishment.
#[async_trait]
pub trait BleAdapter: Send + Sync {
    /// The connected-peer handle this adapter produces.
    type Peer: BlePeer;

    /// Scan for advertisements for up to `window`, pushing each observation
    /// into `sink`. Cancelation is by dropping the returned future; the
    /// caller additionally enforces the deadline.
    async fn scan(
        &self,
        window: Duration,
        sink: mpsc::Sender<Advertisement>,
    ) -> Result<(), TransportError>;

    /// Open a transport-level connection to `address`.
    async fn connect(
        &self,
        address: &PeerAddress,
        params: &ConnectionParams,
    ) -> Result<Self::Peer, TransportError>;
}

/// A connected GATT peer.
///
/// Methods take `&self`: implementations are expected to handle interior
/// synchronization the way platform BLE stacks do.
#[async_trait]
pub trait BlePeer: Send + Sync + 'static {
    /// Discover the peer's services, returning their UUIDs.
    async fn discover_services(&self) -> Result<Vec<Uuid>, TransportError>;

    /// Discover the characteristics of one service, returning their UUIDs.
    async fn discover_characteristics(&self, service: Uuid) -> Result<Vec<Uuid>, TransportError>;

    /// Write one frame to a characteristic without response.
    async fn write_without_response(
        &self,
        characteristic: Uuid,
        frame: &[u8],
    ) -> Result<(), TransportError>;

    /// Enable notifications on a characteristic, forwarding each notified
    /// frame into `sink`. A full channel must apply backpressure, not drop.
    async fn subscribe(
        &self,
        characteristic: Uuid,
        sink: mpsc::Sender<Vec<u8>>,
    ) -> Result<(), TransportError>;

    /// Tear down the transport connection.
    async fn disconnect(&self) -> Result<(), TransportError>;
}
