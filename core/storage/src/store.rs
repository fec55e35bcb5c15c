//! Session store trait definition.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use vaultsync_common::{Error, Result};
use crate::keys::StoreKey;

/// Scoped key/value persistence for session data.
///
/// Values are text. Each key belongs to a fixed [`Scope`](crate::Scope).
/// Implementations must be safe to share between tasks.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a single value.
    async fn get(&self, key: StoreKey) -> Result<Option<String>>;

    /// Write a single value.
    async fn set(&self, key: StoreKey, value: String) -> Result<()>;

    /// Remove a single value. Removing an absent key is not an error.
    async fn remove(&self, key: StoreKey) -> Result<()>;

    /// Write `entries` and remove `removed` as one batch. Keys may span both
    /// scopes; a key in both lists ends up removed.
    ///
    /// # Postconditions
    /// - A reader running after the batch completes observes all of it or,
    ///   on error, none of it
    async fn apply(&self, entries: Vec<(StoreKey, String)>, removed: &[StoreKey]) -> Result<()>;

    /// Write several values as one batch.
    async fn set_many(&self, entries: Vec<(StoreKey, String)>) -> Result<()> {
        self.apply(entries, &[]).await
    }

    /// Remove several values as one batch.
    async fn remove_many(&self, keys: &[StoreKey]) -> Result<()> {
        self.apply(Vec::new(), keys).await
    }
}

/// Encode a structured value as stored text.
pub fn encode_value<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| {
        Error::Serialization(format!("Failed to encode stored value: {}", e))
    })
}

/// Decode stored text into a structured value.
pub fn decode_value<T: DeserializeOwned>(key: StoreKey, text: &str) -> Result<T> {
    serde_json::from_str(text)
        .map_err(|e| Error::Storage(format!("Corrupt value for {}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_roundtrip() {
        let domains = vec!["priv.example".to_string()];
        let text = encode_value(&domains).unwrap();
        let decoded: Vec<String> = decode_value(StoreKey::PrivateEmailDomains, &text).unwrap();
        assert_eq!(decoded, domains);
    }

    #[test]
    fn test_corrupt_value_names_key() {
        let err = decode_value::<u64>(StoreKey::RevisionNumber, "seven").unwrap_err();
        assert!(err.to_string().contains("vaultRevisionNumber"));
    }
}
