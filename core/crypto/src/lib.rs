//! Cryptographic collaborators for VaultSync.
//!
//! This module provides:
//! - Authenticated encryption of the vault using XChaCha20-Poly1305
//! - The externally derived vault key with automatic zeroization
//! - Text-safe encoding for ciphertext blobs and keys
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged

pub mod aead;
pub mod cipher;
pub mod encoding;
pub mod keys;

pub use aead::{decrypt, encrypt};
pub use cipher::{VaultCipher, XChaChaCipher};
pub use encoding::{decode_text, encode_text};
pub use keys::{DerivedKey, KEY_LENGTH};
