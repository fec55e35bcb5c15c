//! Common types used throughout VaultSync.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Server-assigned vault revision number.
///
/// Monotonically non-decreasing from the client's point of view.
pub type Revision = u64;

/// Access token plus single-use refresh token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    /// Create a new token pair.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenPair([REDACTED])")
    }
}

/// Durable login session.
///
/// Survives process restarts and is only destroyed by logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    pub tokens: TokenPair,
    /// Server URL override; the configured default applies when absent.
    #[serde(default)]
    pub api_base_url: Option<String>,
}

/// Public and private email domain lists paired with the vault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainLists {
    pub public: Vec<String>,
    pub private: Vec<String>,
}

impl DomainLists {
    /// Create domain lists.
    pub fn new(public: Vec<String>, private: Vec<String>) -> Self {
        Self { public, private }
    }

    /// Check whether the domain of `email` is one of the private domains.
    ///
    /// Comparison is case-insensitive. Addresses without an `@` never match.
    pub fn is_private_address(&self, email: &str) -> bool {
        let Some((_, domain)) = email.rsplit_once('@') else {
            return false;
        };
        self.private
            .iter()
            .any(|private| private.eq_ignore_ascii_case(domain))
    }
}
