//! Protocol constants for the BLINK link layer.
//!
//! These values are fixed by the peripheral's wire protocol and MUST NOT be
//! changed.

use std::time::Duration;

use uuid::Uuid;

// =============================================================================
// FRAMING
// =============================================================================

/// Maximum size of one transport frame (the usable BLE write/notify payload).
pub const MAX_FRAME_SIZE: usize = 20;

/// Size of the frame header (fragment kind + declared payload length).
pub const FRAME_HEADER_SIZE: usize = 1;

/// Maximum fragment payload per frame (one byte reserved for the header).
pub const MAX_FRAGMENT_PAYLOAD: usize = MAX_FRAME_SIZE - FRAME_HEADER_SIZE;

/// Mask for the declared-length field (low 6 bits of the header byte).
pub const FRAME_LENGTH_MASK: u8 = 0x3F;

/// Largest length the 6-bit header field can declare.
pub const MAX_DECLARED_LENGTH: usize = FRAME_LENGTH_MASK as usize;

/// Byte offset of the peer's declared protocol version within a
/// connection-request frame.
pub const PROTOCOL_VERSION_OFFSET: usize = 2;

// =============================================================================
// GATT IDENTIFIERS
// =============================================================================
//
// Direction names follow the peripheral's perspective: the host writes
// outbound frames to the read characteristic and subscribes to notifications
// on the write characteristic.

/// Read-direction characteristic. Outbound frames are written here.
pub const READ_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x7d2a4bda_d29b_4152_b725_2491478c5cd7);

/// Write-direction characteristic. Inbound notifications arrive here.
pub const WRITE_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x30619f2d_0f54_41bd_a65a_7588d8c85b45);

/// 16-bit short UUID advertised by compatible peripherals.
pub const SERVICE_UUID_SHORT: u16 = 0xFEE3;

/// The Bluetooth base UUID (`00000000-0000-1000-8000-00805F9B34FB`).
const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5f9b_34fb;

/// Expand a 16-bit short UUID against the Bluetooth base UUID.
pub const fn expand_short_uuid(short: u16) -> Uuid {
    Uuid::from_u128(((short as u128) << 96) | BLUETOOTH_BASE_UUID)
}

/// Full 128-bit form of [`SERVICE_UUID_SHORT`], used to filter advertisements.
pub const SERVICE_UUID: Uuid = expand_short_uuid(SERVICE_UUID_SHORT);

// =============================================================================
// HANDSHAKE TIMING
// =============================================================================

/// Attempt budget for each retried handshake step.
pub const HANDSHAKE_ATTEMPTS: u32 = 3;

/// Initial backoff delay between handshake attempts.
pub const HANDSHAKE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// How long a scan runs before results are finalized.
pub const SCAN_WINDOW: Duration = Duration::from_secs(3);

/// Overall bound on the initial connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(6);

/// Default transport-level connection timeout parameter.
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(3);

// =============================================================================
// CHANNELS
// =============================================================================

/// Default capacity for the inbound frame and delivered-message channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;
