//! Sealing and opening the vault database.

use std::sync::Arc;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use vaultsync_common::{Error, Result};
use vaultsync_crypto::{decode_text, encode_text, DerivedKey, VaultCipher};
use crate::database::{Materializer, VaultHandle};

/// Turns database handles into text-safe ciphertext and back.
pub struct VaultCodec<M: Materializer> {
    cipher: Arc<dyn VaultCipher>,
    materializer: M,
}

impl<M: Materializer> VaultCodec<M> {
    /// Create a codec from a cipher and a database materializer.
    pub fn new(cipher: Arc<dyn VaultCipher>, materializer: M) -> Self {
        Self {
            cipher,
            materializer,
        }
    }

    /// Decrypt `blob` with `key` and load the result into a live handle.
    ///
    /// # Errors
    /// - `VaultUnavailable` if either input is missing
    /// - `DecryptFailure` if decoding, decryption or integrity fails
    /// - `ValidationFailure` if the database schema is newer than supported
    pub fn open(&self, blob: Option<&str>, key: Option<&DerivedKey>) -> Result<M::Handle> {
        let (blob, key) = match (blob, key) {
            (Some(blob), Some(key)) => (blob, key),
            (None, _) => {
                return Err(Error::VaultUnavailable("No vault is stored".to_string()))
            }
            (_, None) => return Err(Error::VaultUnavailable("Vault is locked".to_string())),
        };

        let ciphertext = decode_text(blob)?;
        let plaintext = Zeroizing::new(self.cipher.decrypt(&ciphertext, key)?);

        self.materializer
            .load_from_bytes(&plaintext)
            .map_err(|err| match err {
                Error::Serialization(msg) => {
                    warn!("Decrypted vault could not be loaded");
                    Error::DecryptFailure(msg)
                }
                other => other,
            })
    }

    /// Export `handle` and encrypt it with `key`.
    ///
    /// # Postconditions
    /// - Returns text-safe ciphertext ready for persistence or upload
    pub fn seal(&self, handle: &M::Handle, key: &DerivedKey) -> Result<String> {
        let plaintext = Zeroizing::new(handle.export_to_bytes()?);
        let ciphertext = self.cipher.encrypt(&plaintext, key)?;
        debug!(len = ciphertext.len(), "Sealed vault");
        Ok(encode_text(&ciphertext))
    }
}
