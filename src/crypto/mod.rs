//! BLINK Protocol - Crypto Layer
//!
//! Wraps the XChaCha20-Poly1305 AEAD primitive in a [`CryptoSession`] that
//! owns the two per-direction nonce counters. The session performs no key
//! agreement of its own: key material is established out-of-band and handed
//! in as [`SessionKeys`].

mod nonce;
mod session;

pub use nonce::*;
pub use session::*;

use chacha20poly1305::XChaCha20Poly1305;
use chacha20poly1305::aead::generic_array::typenum::Unsigned;
use chacha20poly1305::aead::{AeadCore, KeySizeUser};

/// Session key size (XChaCha20: 256 bits).
pub const KEY_SIZE: usize = <XChaCha20Poly1305 as KeySizeUser>::KeySize::USIZE;

/// Nonce size (XChaCha20: 192 bits).
pub const NONCE_SIZE: usize = <XChaCha20Poly1305 as AeadCore>::NonceSize::USIZE;

/// Authentication-tag overhead appended to every ciphertext (Poly1305).
pub const TAG_SIZE: usize = <XChaCha20Poly1305 as AeadCore>::TagSize::USIZE;
