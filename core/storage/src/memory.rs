//! In-memory session store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use vaultsync_common::Result;
use crate::keys::{Scope, StoreKey};
use crate::store::SessionStore;

/// Both storage tiers.
#[derive(Debug, Default, Clone)]
pub(crate) struct Tiers {
    durable: HashMap<StoreKey, String>,
    ephemeral: HashMap<StoreKey, String>,
}

impl Tiers {
    pub(crate) fn tier(&self, scope: Scope) -> &HashMap<StoreKey, String> {
        match scope {
            Scope::Durable => &self.durable,
            Scope::Ephemeral => &self.ephemeral,
        }
    }

    pub(crate) fn tier_mut(&mut self, scope: Scope) -> &mut HashMap<StoreKey, String> {
        match scope {
            Scope::Durable => &mut self.durable,
            Scope::Ephemeral => &mut self.ephemeral,
        }
    }

    pub(crate) fn get(&self, key: StoreKey) -> Option<String> {
        self.tier(key.scope()).get(&key).cloned()
    }

    pub(crate) fn insert(&mut self, key: StoreKey, value: String) {
        self.tier_mut(key.scope()).insert(key, value);
    }

    pub(crate) fn remove(&mut self, key: StoreKey) {
        self.tier_mut(key.scope()).remove(&key);
    }

    pub(crate) fn apply(&mut self, entries: Vec<(StoreKey, String)>, removed: &[StoreKey]) {
        for (key, value) in entries {
            self.insert(key, value);
        }
        for key in removed {
            self.remove(*key);
        }
    }
}

/// In-memory session store.
///
/// Useful for testing and for hosts that persist session data themselves.
/// Every batch runs under a single write lock, so readers never observe a
/// partially applied batch.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tiers: Arc<RwLock<Tiers>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// List the keys currently present, in key order.
    pub async fn present_keys(&self) -> Vec<StoreKey> {
        let tiers = self.tiers.read().await;
        let mut keys: Vec<StoreKey> = StoreKey::ALL
            .into_iter()
            .filter(|key| tiers.tier(key.scope()).contains_key(key))
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>> {
        Ok(self.tiers.read().await.get(key))
    }

    async fn set(&self, key: StoreKey, value: String) -> Result<()> {
        self.tiers.write().await.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: StoreKey) -> Result<()> {
        self.tiers.write().await.remove(key);
        Ok(())
    }

    async fn apply(&self, entries: Vec<(StoreKey, String)>, removed: &[StoreKey]) -> Result<()> {
        self.tiers.write().await.apply(entries, removed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();

        store.set(StoreKey::Username, "alice".to_string()).await.unwrap();
        assert_eq!(
            store.get(StoreKey::Username).await.unwrap().as_deref(),
            Some("alice")
        );

        store.remove(StoreKey::Username).await.unwrap();
        assert_eq!(store.get(StoreKey::Username).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_absent_key_ok() {
        let store = MemoryStore::new();
        assert!(store.remove(StoreKey::VaultBlob).await.is_ok());
    }

    #[tokio::test]
    async fn test_batch_spans_scopes() {
        let store = MemoryStore::new();
        store
            .set_many(vec![
                (StoreKey::AccessToken, "a".to_string()),
                (StoreKey::VaultBlob, "b".to_string()),
            ])
            .await
            .unwrap();

        assert_eq!(
            store.present_keys().await,
            vec![StoreKey::AccessToken, StoreKey::VaultBlob]
        );

        store.remove_many(&StoreKey::ALL).await.unwrap();
        assert!(store.present_keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_ephemeral_removal_leaves_durable() {
        let store = MemoryStore::new();
        store.set(StoreKey::RefreshToken, "r".to_string()).await.unwrap();
        store.set(StoreKey::DerivedKey, "k".to_string()).await.unwrap();

        store.remove_many(&StoreKey::EPHEMERAL).await.unwrap();

        assert_eq!(store.present_keys().await, vec![StoreKey::RefreshToken]);
    }

    #[tokio::test]
    async fn test_apply_writes_and_removes_together() {
        let store = MemoryStore::new();
        store
            .set_many(vec![
                (StoreKey::ApiBaseUrl, "https://old.example".to_string()),
                (StoreKey::AccessToken, "old".to_string()),
            ])
            .await
            .unwrap();

        store
            .apply(
                vec![
                    (StoreKey::AccessToken, "new".to_string()),
                    (StoreKey::VaultBlob, "dropped".to_string()),
                ],
                &[StoreKey::ApiBaseUrl, StoreKey::VaultBlob],
            )
            .await
            .unwrap();

        assert_eq!(store.present_keys().await, vec![StoreKey::AccessToken]);
        assert_eq!(
            store.get(StoreKey::AccessToken).await.unwrap().as_deref(),
            Some("new")
        );
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set(StoreKey::Username, "bob".to_string()).await.unwrap();
        assert!(other.get(StoreKey::Username).await.unwrap().is_some());
    }
}
