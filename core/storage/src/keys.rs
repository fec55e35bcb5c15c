//! Persisted keys and their storage lifetimes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifetime of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Survives process restarts; cleared only by logout.
    Durable,
    /// Scoped to one unlock session.
    Ephemeral,
}

/// Every key the sync engine persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StoreKey {
    Username,
    AccessToken,
    RefreshToken,
    ApiBaseUrl,
    VaultBlob,
    DerivedKey,
    PublicEmailDomains,
    PrivateEmailDomains,
    RevisionNumber,
}

impl StoreKey {
    /// Keys of the durable tier.
    pub const DURABLE: [StoreKey; 4] = [
        StoreKey::Username,
        StoreKey::AccessToken,
        StoreKey::RefreshToken,
        StoreKey::ApiBaseUrl,
    ];

    /// Keys of the ephemeral tier.
    pub const EPHEMERAL: [StoreKey; 5] = [
        StoreKey::VaultBlob,
        StoreKey::DerivedKey,
        StoreKey::PublicEmailDomains,
        StoreKey::PrivateEmailDomains,
        StoreKey::RevisionNumber,
    ];

    /// Every key, durable first.
    pub const ALL: [StoreKey; 9] = [
        StoreKey::Username,
        StoreKey::AccessToken,
        StoreKey::RefreshToken,
        StoreKey::ApiBaseUrl,
        StoreKey::VaultBlob,
        StoreKey::DerivedKey,
        StoreKey::PublicEmailDomains,
        StoreKey::PrivateEmailDomains,
        StoreKey::RevisionNumber,
    ];

    /// Get the storage lifetime of this key.
    pub fn scope(self) -> Scope {
        match self {
            StoreKey::Username
            | StoreKey::AccessToken
            | StoreKey::RefreshToken
            | StoreKey::ApiBaseUrl => Scope::Durable,
            StoreKey::VaultBlob
            | StoreKey::DerivedKey
            | StoreKey::PublicEmailDomains
            | StoreKey::PrivateEmailDomains
            | StoreKey::RevisionNumber => Scope::Ephemeral,
        }
    }

    /// Stable name used in persisted documents.
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::Username => "username",
            StoreKey::AccessToken => "accessToken",
            StoreKey::RefreshToken => "refreshToken",
            StoreKey::ApiBaseUrl => "apiBaseUrl",
            StoreKey::VaultBlob => "encryptedVault",
            StoreKey::DerivedKey => "derivedKey",
            StoreKey::PublicEmailDomains => "publicEmailDomains",
            StoreKey::PrivateEmailDomains => "privateEmailDomains",
            StoreKey::RevisionNumber => "vaultRevisionNumber",
        }
    }

    /// Look up a key by its persisted name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_constants_match_scope() {
        assert!(StoreKey::DURABLE.iter().all(|k| k.scope() == Scope::Durable));
        assert!(StoreKey::EPHEMERAL
            .iter()
            .all(|k| k.scope() == Scope::Ephemeral));
        assert_eq!(
            StoreKey::ALL.len(),
            StoreKey::DURABLE.len() + StoreKey::EPHEMERAL.len()
        );
    }

    #[test]
    fn test_name_lookup() {
        for key in StoreKey::ALL {
            assert_eq!(StoreKey::from_name(key.as_str()), Some(key));
        }
        assert_eq!(StoreKey::from_name("nope"), None);
    }
}
