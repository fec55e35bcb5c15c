//! File-backed session store.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use vaultsync_common::{Error, Result};
use crate::keys::{Scope, StoreKey};
use crate::memory::Tiers;
use crate::store::SessionStore;

/// Name of the durable session document.
pub const SESSION_FILENAME: &str = "session.json";

/// Application directory under the platform data directory.
const APP_DIRNAME: &str = "vaultsync";

/// Session store persisting the durable tier to disk.
///
/// The durable tier is a JSON document replaced atomically on every write.
/// The ephemeral tier lives in memory only, so restarting the process
/// locks the vault again.
pub struct FileStore {
    path: PathBuf,
    tiers: RwLock<Tiers>,
}

impl FileStore {
    /// Open a store rooted at `dir`.
    ///
    /// # Postconditions
    /// - `dir` exists
    /// - The durable tier is loaded from a previous run if present
    ///
    /// # Errors
    /// - Directory cannot be created
    /// - Existing session document cannot be read or parsed
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;
        let path = dir.join(SESSION_FILENAME);

        let mut tiers = Tiers::default();
        if fs::try_exists(&path).await? {
            let text = fs::read_to_string(&path).await?;
            let document: BTreeMap<String, String> = serde_json::from_str(&text)
                .map_err(|e| Error::Storage(format!("Corrupt session document: {}", e)))?;

            for (name, value) in document {
                match StoreKey::from_name(&name) {
                    Some(key) if key.scope() == Scope::Durable => tiers.insert(key, value),
                    _ => warn!("Ignoring unexpected session entry: {}", name),
                }
            }
            info!("Restored durable session from {}", path.display());
        }

        Ok(Self {
            path,
            tiers: RwLock::new(tiers),
        })
    }

    /// Open a store in the platform data directory.
    pub async fn open_default() -> Result<Self> {
        let base = dirs::data_dir().ok_or_else(|| {
            Error::Storage("No platform data directory available".to_string())
        })?;
        Self::open(base.join(APP_DIRNAME)).await
    }

    /// Path of the durable session document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the tiers, persist, then publish.
    ///
    /// The in-memory state is only replaced once the document is on disk.
    async fn commit<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Tiers),
    {
        let mut tiers = self.tiers.write().await;
        let mut next = tiers.clone();
        change(&mut next);

        if next.tier(Scope::Durable) != tiers.tier(Scope::Durable) {
            self.persist(&next).await?;
        }

        *tiers = next;
        Ok(())
    }

    async fn persist(&self, tiers: &Tiers) -> Result<()> {
        let document: BTreeMap<&str, &String> = tiers
            .tier(Scope::Durable)
            .iter()
            .map(|(key, value)| (key.as_str(), value))
            .collect();
        let text = serde_json::to_string_pretty(&document)?;

        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).await?;

        // Tokens live in this document: owner only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600)).await?;
        }

        file.write_all(text.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp, &self.path).await?;

        debug!("Persisted {} durable entries", document.len());
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>> {
        Ok(self.tiers.read().await.get(key))
    }

    async fn set(&self, key: StoreKey, value: String) -> Result<()> {
        self.commit(|tiers| tiers.insert(key, value)).await
    }

    async fn remove(&self, key: StoreKey) -> Result<()> {
        self.commit(|tiers| tiers.remove(key)).await
    }

    async fn apply(&self, entries: Vec<(StoreKey, String)>, removed: &[StoreKey]) -> Result<()> {
        self.commit(|tiers| tiers.apply(entries, removed)).await
    }
}
