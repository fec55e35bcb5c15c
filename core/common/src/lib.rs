//! Common utilities and types shared across the VaultSync crates.
//!
//! This module provides the error taxonomy and the session/vault value types
//! that every layer of the sync engine passes around.

pub mod error;
pub mod types;
pub mod validation;

pub use error::{Error, ErrorKind, Result};
pub use types::{DomainLists, Revision, Session, TokenPair};
pub use validation::ValidationIssue;
