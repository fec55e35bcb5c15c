//! Text-safe encoding for ciphertext blobs and key material.

use base64::{engine::general_purpose::STANDARD, Engine};

use vaultsync_common::{Error, Result};

/// Encode bytes as standard base64.
pub fn encode_text(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64 text.
///
/// Malformed input is reported as a decryption failure, since the only
/// encoded values are vault blobs and keys.
pub fn decode_text(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| Error::DecryptFailure(format!("Invalid encoding: {}", e)))
}
