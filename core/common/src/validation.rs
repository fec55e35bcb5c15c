//! Compatibility and provisioning problems reported to the user.
//!
//! The same condition can surface during login, sync or unlock, so the text
//! lives here and nowhere else.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Error;

/// A server response that the client cannot work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationIssue {
    #[error("This version of the client is no longer supported. Please update to the latest version.")]
    ClientVersionUnsupported,

    #[error("The server version is not compatible with this client. Please update the client.")]
    ServerVersionUnsupported,

    #[error("Server is not available. Please check your connection and try again later.")]
    ServerUnavailable,

    #[error("The vault on the server requires a merge, which this client does not support.")]
    VaultMergeRequired,

    #[error("The vault on the server is not ready. Please try again later.")]
    VaultNotReady,

    #[error("No vault has been set up for this account yet.")]
    VaultNotProvisioned,

    #[error("The vault was saved by a newer client. Please update to open it.")]
    VaultVersionUnsupported,
}

impl From<ValidationIssue> for Error {
    fn from(issue: ValidationIssue) -> Self {
        Error::ValidationFailure(issue.to_string())
    }
}
