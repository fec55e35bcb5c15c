//! Vault codec for VaultSync.
//!
//! This module provides:
//! - The database collaborator contract (load from bytes, export to bytes)
//! - A deterministic document database holding credentials and settings
//! - Sealing and opening the database with the derived key
//!
//! # Architecture
//! The codec sits between the sync engine and the cipher, turning live
//! database handles into text-safe ciphertext and back.

pub mod codec;
pub mod database;
pub mod document;

pub use codec::VaultCodec;
pub use database::{Materializer, VaultHandle};
pub use document::{Credential, DocumentMaterializer, VaultDocument, SCHEMA_VERSION};
