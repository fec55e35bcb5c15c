//! Vault key with secure memory handling.
//!
//! The key is derived from the master password outside this crate and only
//! ever held in the ephemeral session tier.

use chacha20poly1305::{
    aead::{KeyInit, OsRng},
    XChaCha20Poly1305,
};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use vaultsync_common::{Error, Result};
use crate::encoding::{decode_text, encode_text};

/// Length of encryption keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Symmetric key that opens the vault.
///
/// Its absence from the session store means the vault is locked.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    /// Create a derived key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Create a derived key from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let key: [u8; KEY_LENGTH] = bytes.try_into().map_err(|_| {
            Error::InvalidInput(format!(
                "Invalid key length: expected {}, got {}",
                KEY_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self { key })
    }

    /// Generate a random key.
    pub fn generate() -> Self {
        let generated = XChaCha20Poly1305::generate_key(&mut OsRng);
        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(&generated);
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    /// Encode the key as text for the ephemeral session tier.
    pub fn to_encoded(&self) -> String {
        encode_text(&self.key)
    }

    /// Decode a key previously produced by [`DerivedKey::to_encoded`].
    pub fn from_encoded(encoded: &str) -> Result<Self> {
        let mut bytes = decode_text(encoded)?;
        let key = Self::from_slice(&bytes);
        bytes.zeroize();
        key
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_roundtrip() {
        let key = DerivedKey::from_bytes([7u8; KEY_LENGTH]);
        let decoded = DerivedKey::from_encoded(&key.to_encoded()).unwrap();
        assert_eq!(decoded.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_generate_is_random() {
        let key1 = DerivedKey::generate();
        let key2 = DerivedKey::generate();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(DerivedKey::from_slice(&[0u8; 16]).is_err());
        assert!(DerivedKey::from_encoded(&encode_text(&[1u8; 31])).is_err());
    }

    #[test]
    fn test_debug_redacted() {
        let key = DerivedKey::from_bytes([0xAB; KEY_LENGTH]);
        assert_eq!(format!("{:?}", key), "DerivedKey([REDACTED])");
    }
}
