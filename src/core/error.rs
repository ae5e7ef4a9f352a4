//! Error types for the BLINK protocol.

use thiserror::Error;
use uuid::Uuid;

/// Errors in the crypto layer.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// AEAD encryption failed.
    #[error("AEAD encryption failed")]
    EncryptionFailed,

    /// AEAD authentication failed (invalid tag, corrupted frame, or a
    /// desynchronized receive nonce).
    #[error("verification failed")]
    VerificationFailed,
}

/// Adapter-level transport failures.
///
/// Discovery-step failures are retried by the handshake sequencer; connect
/// and write failures surface immediately.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Advertisement scan failed.
    #[error("scan failed: {0}")]
    ScanFailed(String),

    /// Opening the transport-level connection failed.
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// Service discovery failed.
    #[error("service discovery failed: {0}")]
    DiscoveryFailed(String),

    /// A protocol characteristic is missing from the discovered services.
    #[error("characteristic {0} not found")]
    CharacteristicNotFound(Uuid),

    /// A write to the peripheral failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Enabling notifications failed.
    #[error("subscribe failed: {0}")]
    SubscribeFailed(String),

    /// No transport connection is open.
    #[error("not connected")]
    NotConnected,
}

/// Top-level BLINK errors.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Crypto error.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// An unknown scan-result identifier was passed to `connect`.
    #[error("no device found with id {0}")]
    UnknownDevice(u32),

    /// The initial connection attempt exceeded its overall timeout.
    #[error("connect timed out")]
    ConnectTimeout,
}
