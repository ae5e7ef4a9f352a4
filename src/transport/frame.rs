//! Frame header codec and outbound fragmentation.
//!
//! Every transport frame starts with a single header byte: the top 2 bits
//! carry the fragment kind, the low 6 bits the declared payload length
//! (0-63). The remaining bytes are fragment payload.

use crate::core::{FRAME_LENGTH_MASK, MAX_DECLARED_LENGTH, MAX_FRAGMENT_PAYLOAD, MAX_FRAME_SIZE};

/// A frame's role in a possibly-multi-frame logical message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// A complete message in one frame.
    Solo = 0b00,
    /// First fragment of a multi-frame message.
    Start = 0b01,
    /// Middle fragment.
    Continue = 0b10,
    /// Final fragment.
    End = 0b11,
}

impl FrameKind {
    /// Decode a kind from the top 2 bits of a header byte.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => FrameKind::Solo,
            0b01 => FrameKind::Start,
            0b10 => FrameKind::Continue,
            _ => FrameKind::End,
        }
    }

    /// The 2-bit wire value.
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Pack a fragment kind and payload length into a header byte.
///
/// `length` must be at most 63 (the 6-bit field); callers additionally
/// guarantee `length <= 19` for validity against the 20-byte transport MTU.
/// Violations are programmer errors, not protocol errors.
pub fn encode_header(kind: FrameKind, length: usize) -> u8 {
    debug_assert!(length <= MAX_DECLARED_LENGTH);
    (kind.bits() << 6) | (length as u8 & FRAME_LENGTH_MASK)
}

/// Unpack a header byte into its fragment kind and declared payload length.
///
/// Exact inverse of [`encode_header`]; total, since all four 2-bit values
/// name a kind.
pub fn decode_header(byte: u8) -> (FrameKind, usize) {
    (
        FrameKind::from_bits(byte >> 6),
        (byte & FRAME_LENGTH_MASK) as usize,
    )
}

fn frame_of(kind: FrameKind, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(1 + payload.len());
    frame.push(encode_header(kind, payload.len()));
    frame.extend_from_slice(payload);
    frame
}

/// Split an outbound buffer into transport frames, in byte order.
///
/// Buffers under 20 bytes fit a single Solo frame. Larger buffers become one
/// Start frame of 19 payload bytes, Continue frames of 19 bytes while at
/// least 20 bytes remain, and one End frame carrying the remainder (1-19
/// bytes). Receivers rely on arrival order, not sequence numbers.
pub fn fragment(buffer: &[u8]) -> Vec<Vec<u8>> {
    let size = buffer.len();
    if size < MAX_FRAME_SIZE {
        return vec![frame_of(FrameKind::Solo, buffer)];
    }

    let mut frames = vec![frame_of(FrameKind::Start, &buffer[..MAX_FRAGMENT_PAYLOAD])];
    let mut offset = MAX_FRAGMENT_PAYLOAD;

    while size - offset >= MAX_FRAME_SIZE {
        frames.push(frame_of(
            FrameKind::Continue,
            &buffer[offset..offset + MAX_FRAGMENT_PAYLOAD],
        ));
        offset += MAX_FRAGMENT_PAYLOAD;
    }

    frames.push(frame_of(FrameKind::End, &buffer[offset..]));
    frames
}
