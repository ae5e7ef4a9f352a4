//! Counter nonces for XChaCha20-Poly1305.
//!
//! Each direction of an encrypted session owns one [`Nonce`]: a 24-byte
//! buffer treated as a little-endian unsigned integer, incremented by one
//! after each use. A nonce value is never reused for the same direction
//! within a session's lifetime.

use super::NONCE_SIZE;

/// A 24-byte counter nonce.
///
/// The byte order is little-endian, so byte 0 is the least significant.
/// Wrap-around is not handled: a session is assumed short-lived relative to
/// the 192-bit nonce space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nonce {
    bytes: [u8; NONCE_SIZE],
}

impl Nonce {
    /// The all-zero nonce both directions start from.
    pub const fn zero() -> Self {
        Self {
            bytes: [0u8; NONCE_SIZE],
        }
    }

    /// Create a nonce from raw bytes (little-endian counter).
    pub const fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self { bytes }
    }

    /// Get the raw nonce bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.bytes
    }

    /// Increment the counter by one, carrying across bytes.
    pub fn increment(&mut self) {
        for byte in self.bytes.iter_mut() {
            let (value, carry) = byte.overflowing_add(1);
            *byte = value;
            if !carry {
                break;
            }
        }
    }
}

impl Default for Nonce {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_from_zero() {
        let mut nonce = Nonce::zero();
        nonce.increment();

        let mut expected = [0u8; NONCE_SIZE];
        expected[0] = 1;
        assert_eq!(nonce.as_bytes(), &expected);
    }

    #[test]
    fn test_increment_carries() {
        let mut bytes = [0u8; NONCE_SIZE];
        bytes[0] = 0xFF;
        bytes[1] = 0xFF;
        let mut nonce = Nonce::from_bytes(bytes);
        nonce.increment();

        let mut expected = [0u8; NONCE_SIZE];
        expected[2] = 1;
        assert_eq!(nonce.as_bytes(), &expected);
    }

    #[test]
    fn test_increment_is_dense() {
        // 300 increments cover a byte boundary without skipping values.
        let mut nonce = Nonce::zero();
        for _ in 0..300 {
            nonce.increment();
        }

        let mut expected = [0u8; NONCE_SIZE];
        expected[0] = (300 % 256) as u8;
        expected[1] = (300 / 256) as u8;
        assert_eq!(nonce.as_bytes(), &expected);
    }
}
