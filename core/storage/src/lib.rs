//! Session storage for VaultSync.
//!
//! This module provides the two-tier key/value store behind the sync engine:
//! - A durable tier for the login session, surviving process restarts
//! - An ephemeral tier for the key and vault, scoped to one unlock session
//!
//! Both tiers share one interface, so batches may span them atomically.

pub mod file;
pub mod keys;
pub mod memory;
pub mod store;

pub use file::FileStore;
pub use keys::{Scope, StoreKey};
pub use memory::MemoryStore;
pub use store::{decode_value, encode_value, SessionStore};
