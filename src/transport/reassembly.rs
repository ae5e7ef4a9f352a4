//! Single-slot reassembly of inbound frames into logical messages.

use tracing::trace;

use super::{FrameKind, decode_header};

/// Accumulates fragment payloads in arrival order and emits complete
/// logical messages.
///
/// Only one multi-fragment message can be in flight at a time: a Start frame
/// received while another assembly is pending silently discards the previous
/// one. Higher layers do not retransmit or resequence, so the exact discard
/// behavior is part of the protocol.
#[derive(Debug, Default)]
pub struct Reassembler {
    pending: Option<Vec<u8>>,
}

impl Reassembler {
    /// Create an empty reassembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a multi-fragment assembly is in progress.
    pub fn in_progress(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume one raw frame; returns the assembled message when the frame
    /// completes one.
    ///
    /// Malformed frames - empty, or declaring more payload than the frame
    /// carries - are dropped silently, matching the receiver-robustness
    /// expectations of a lossy link. A Continue with no assembly in progress
    /// is likewise dropped.
    pub fn receive(&mut self, frame: &[u8]) -> Option<Vec<u8>> {
        let (&header, rest) = frame.split_first()?;
        let (kind, declared) = decode_header(header);
        if declared > rest.len() {
            trace!(declared, actual = rest.len(), "dropping malformed frame");
            return None;
        }
        let payload = &rest[..declared];

        match kind {
            FrameKind::Solo => Some(payload.to_vec()),
            FrameKind::Start => {
                if self.pending.is_some() {
                    trace!("discarding incomplete assembly on new start frame");
                }
                self.pending = Some(payload.to_vec());
                None
            }
            FrameKind::Continue => {
                match self.pending.as_mut() {
                    Some(buffer) => buffer.extend_from_slice(payload),
                    None => trace!("dropping continue frame with no assembly in progress"),
                }
                None
            }
            FrameKind::End => {
                let mut buffer = self.pending.take().unwrap_or_default();
                buffer.extend_from_slice(payload);
                Some(buffer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{encode_header, fragment};

    fn frame(kind: FrameKind, payload: &[u8]) -> Vec<u8> {
        let mut f = vec![encode_header(kind, payload.len())];
        f.extend_from_slice(payload);
        f
    }

    #[test]
    fn test_solo_frame_is_a_complete_message() {
        let mut reassembler = Reassembler::new();
        assert_eq!(
            reassembler.receive(&frame(FrameKind::Solo, b"ping")),
            Some(b"ping".to_vec())
        );
        assert!(!reassembler.in_progress());
    }

    #[test]
    fn test_fragmentation_roundtrip_all_sizes() {
        let mut reassembler = Reassembler::new();
        for size in 0..=2000usize {
            let buffer: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
            let frames = fragment(&buffer);

            let mut messages = Vec::new();
            for (index, raw) in frames.iter().enumerate() {
                if let Some(message) = reassembler.receive(raw) {
                    // Only the terminal fragment may complete a message.
                    assert_eq!(index, frames.len() - 1, "early completion at size {size}");
                    messages.push(message);
                }
            }
            assert_eq!(messages, vec![buffer], "mismatch at size {size}");
        }
    }

    #[test]
    fn test_continue_without_start_is_dropped() {
        let mut reassembler = Reassembler::new();
        assert_eq!(reassembler.receive(&frame(FrameKind::Continue, b"orphan")), None);
        assert!(!reassembler.in_progress());
    }

    #[test]
    fn test_second_start_discards_first_assembly() {
        let mut reassembler = Reassembler::new();
        assert_eq!(reassembler.receive(&frame(FrameKind::Start, b"old-")), None);
        assert_eq!(reassembler.receive(&frame(FrameKind::Start, b"new-")), None);
        assert_eq!(
            reassembler.receive(&frame(FrameKind::End, b"tail")),
            Some(b"new-tail".to_vec())
        );
    }

    #[test]
    fn test_solo_leaves_pending_assembly_untouched() {
        let mut reassembler = Reassembler::new();
        assert_eq!(reassembler.receive(&frame(FrameKind::Start, b"part")), None);
        assert_eq!(
            reassembler.receive(&frame(FrameKind::Solo, b"interleaved")),
            Some(b"interleaved".to_vec())
        );
        assert_eq!(
            reassembler.receive(&frame(FrameKind::End, b"ial")),
            Some(b"partial".to_vec())
        );
    }

    #[test]
    fn test_empty_frame_is_dropped() {
        let mut reassembler = Reassembler::new();
        assert_eq!(reassembler.receive(&[]), None);
    }

    #[test]
    fn test_overdeclared_length_is_dropped() {
        let mut reassembler = Reassembler::new();
        // Header declares 10 payload bytes, frame carries 2.
        let malformed = vec![encode_header(FrameKind::Solo, 10), 0x01, 0x02];
        assert_eq!(reassembler.receive(&malformed), None);
    }

    #[test]
    fn test_trailing_padding_is_ignored() {
        let mut reassembler = Reassembler::new();
        // Header declares 2 bytes; the radio padded the frame to 4.
        let padded = vec![encode_header(FrameKind::Solo, 2), 0xAA, 0xBB, 0x00, 0x00];
        assert_eq!(reassembler.receive(&padded), Some(vec![0xAA, 0xBB]));
    }
}
