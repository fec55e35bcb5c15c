//! Byte-oriented cipher seam used by the vault codec.

use tracing::debug;

use vaultsync_common::Result;
use crate::aead;
use crate::keys::DerivedKey;

/// Symmetric cipher over byte payloads.
///
/// Implementations must authenticate ciphertext and report any integrity
/// failure as `Error::DecryptFailure`.
pub trait VaultCipher: Send + Sync {
    /// Encrypt `plaintext` with `key`.
    fn encrypt(&self, plaintext: &[u8], key: &DerivedKey) -> Result<Vec<u8>>;

    /// Decrypt `ciphertext` with `key`.
    fn decrypt(&self, ciphertext: &[u8], key: &DerivedKey) -> Result<Vec<u8>>;
}

/// XChaCha20-Poly1305 cipher with random nonces.
#[derive(Debug, Clone, Copy, Default)]
pub struct XChaChaCipher;

impl VaultCipher for XChaChaCipher {
    fn encrypt(&self, plaintext: &[u8], key: &DerivedKey) -> Result<Vec<u8>> {
        debug!(len = plaintext.len(), "Encrypting vault payload");
        aead::encrypt(key.as_bytes(), plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8], key: &DerivedKey) -> Result<Vec<u8>> {
        debug!(len = ciphertext.len(), "Decrypting vault payload");
        aead::decrypt(key.as_bytes(), ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cipher_roundtrip() {
        let cipher = XChaChaCipher;
        let key = DerivedKey::generate();

        let ciphertext = cipher.encrypt(b"vault bytes", &key).unwrap();
        assert_eq!(cipher.decrypt(&ciphertext, &key).unwrap(), b"vault bytes");
    }

    #[test]
    fn test_trait_object_usable() {
        let cipher: Box<dyn VaultCipher> = Box::new(XChaChaCipher);
        let key = DerivedKey::generate();
        let other = DerivedKey::generate();

        let ciphertext = cipher.encrypt(b"data", &key).unwrap();
        assert!(cipher.decrypt(&ciphertext, &other).is_err());
    }
}
