//! Common error types for VaultSync.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for VaultSync operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The encrypted vault or the key needed to open it is not present.
    #[error("Vault unavailable: {0}")]
    VaultUnavailable(String),

    /// Decryption or integrity verification of the vault failed.
    #[error("Decryption failed: {0}")]
    DecryptFailure(String),

    /// The server session is no longer valid. A forced logout has happened.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// The server could not be reached.
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),

    /// The server refused an uploaded vault.
    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    /// A server response failed a compatibility or provisioning check.
    #[error("{0}")]
    ValidationFailure(String),

    /// Cryptographic operation failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Session storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error for callers that only render messages.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::VaultUnavailable(_) => ErrorKind::VaultUnavailable,
            Error::DecryptFailure(_) => ErrorKind::DecryptFailure,
            Error::SessionExpired(_) => ErrorKind::SessionExpired,
            Error::ServerUnreachable(_) => ErrorKind::ServerUnreachable,
            Error::UploadRejected(_) => ErrorKind::UploadRejected,
            Error::ValidationFailure(_) => ErrorKind::ValidationFailure,
            Error::Crypto(_) => ErrorKind::DecryptFailure,
            Error::Api { .. } => ErrorKind::Server,
            Error::Storage(_)
            | Error::Serialization(_)
            | Error::InvalidInput(_)
            | Error::NotFound(_)
            | Error::Io(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Coarse error classification exposed to the request layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    VaultUnavailable,
    DecryptFailure,
    SessionExpired,
    ServerUnreachable,
    UploadRejected,
    ValidationFailure,
    Server,
    Internal,
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
