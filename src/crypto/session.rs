//! Encrypted-session state.
//!
//! A [`CryptoSession`] wraps the AEAD primitive and owns the two independent
//! monotonically-incrementing nonces (send, receive). All traffic uses empty
//! AAD; the only authenticated context is the implicit nonce counter.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use zeroize::Zeroize;

use crate::core::CryptoError;

use super::{KEY_SIZE, Nonce, TAG_SIZE};

/// A symmetric session key for one traffic direction.
///
/// Zeroized on drop.
#[derive(Clone)]
pub struct SessionKey {
    key: [u8; KEY_SIZE],
}

impl SessionKey {
    /// Create a session key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Get the raw key bytes.
    ///
    /// # Security
    /// Handle with care - this exposes sensitive key material.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// The key material set for one connection, established out-of-band.
#[derive(Clone)]
pub struct SessionKeys {
    /// Key for host-to-peripheral traffic.
    pub send: SessionKey,
    /// Key for peripheral-to-host traffic.
    pub recv: SessionKey,
}

impl SessionKeys {
    /// Bundle a send and a receive key.
    pub fn new(send: SessionKey, recv: SessionKey) -> Self {
        Self { send, recv }
    }

    /// The same keys viewed from the peer's side (send and receive swapped).
    pub fn flipped(&self) -> Self {
        Self {
            send: self.recv.clone(),
            recv: self.send.clone(),
        }
    }
}

/// An authenticated-encryption session with explicit nonce bookkeeping.
pub struct CryptoSession {
    send_key: SessionKey,
    recv_key: SessionKey,
    send_nonce: Nonce,
    recv_nonce: Nonce,
}

impl CryptoSession {
    /// Create a session with both nonce counters at zero.
    pub fn new(keys: SessionKeys) -> Self {
        Self {
            send_key: keys.send,
            recv_key: keys.recv,
            send_nonce: Nonce::zero(),
            recv_nonce: Nonce::zero(),
        }
    }

    /// Encrypt a plaintext for sending.
    ///
    /// Advances the send nonce exactly once, only on success. The returned
    /// ciphertext is `plaintext.len() + TAG_SIZE` bytes.
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = XChaCha20Poly1305::new(self.send_key.as_bytes().into());
        let ciphertext = cipher
            .encrypt(XNonce::from_slice(self.send_nonce.as_bytes()), plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        self.send_nonce.increment();
        Ok(ciphertext)
    }

    /// Decrypt a received ciphertext.
    ///
    /// Ciphertexts shorter than [`TAG_SIZE`] are rejected before the
    /// primitive is invoked (and before any nonce movement). Otherwise the
    /// receive nonce advances exactly once per call, **whether or not
    /// authentication succeeds**. This mirrors the original implementation:
    /// one corrupted or malicious frame permanently desynchronizes the
    /// receive nonce from the peer's transmit nonce, and every later decrypt
    /// fails until the session is torn down and re-keyed. Kept as observable
    /// protocol behavior; see DESIGN.md.
    pub fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.len() < TAG_SIZE {
            return Err(CryptoError::VerificationFailed);
        }

        let cipher = XChaCha20Poly1305::new(self.recv_key.as_bytes().into());
        let result = cipher.decrypt(XNonce::from_slice(self.recv_nonce.as_bytes()), ciphertext);

        self.recv_nonce.increment();
        result.map_err(|_| CryptoError::VerificationFailed)
    }

    /// Current send nonce.
    pub fn send_nonce(&self) -> &Nonce {
        &self.send_nonce
    }

    /// Current receive nonce.
    pub fn recv_nonce(&self) -> &Nonce {
        &self.recv_nonce
    }
}
