//! Vault sync engine: local vault state, server sync and uploads.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use vaultsync_api::{
    validate_status_response, validate_vault_response, AuthGateway, LogoutReason, VaultTransfer,
};
use vaultsync_common::{DomainLists, Error, Result, Revision, ValidationIssue};
use vaultsync_crypto::DerivedKey;
use vaultsync_storage::{decode_value, encode_value, SessionStore, StoreKey};
use vaultsync_vault::{Credential, Materializer, VaultCodec, VaultHandle};

/// Lifecycle state derived from what the store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EngineState {
    /// No token pair stored.
    LoggedOut,
    /// Authenticated, but the ciphertext or key is missing.
    Locked,
    /// Ciphertext and key are both present.
    Unlocked,
}

/// Fields to persist with [`VaultSyncEngine::store`]. `None` leaves a field untouched.
#[derive(Default)]
pub struct VaultUpdate {
    pub blob: Option<String>,
    pub derived_key: Option<DerivedKey>,
    pub domains: Option<DomainLists>,
    pub revision: Option<Revision>,
}

impl VaultUpdate {
    fn into_entries(self) -> Result<Vec<(StoreKey, String)>> {
        let mut entries = Vec::new();
        if let Some(blob) = self.blob {
            entries.push((StoreKey::VaultBlob, blob));
        }
        if let Some(key) = &self.derived_key {
            entries.push((StoreKey::DerivedKey, key.to_encoded()));
        }
        if let Some(domains) = &self.domains {
            entries.push((StoreKey::PublicEmailDomains, encode_value(&domains.public)?));
            entries.push((StoreKey::PrivateEmailDomains, encode_value(&domains.private)?));
        }
        if let Some(revision) = self.revision {
            entries.push((StoreKey::RevisionNumber, encode_value(&revision)?));
        }
        Ok(entries)
    }
}

/// A decrypted vault with its stored metadata.
pub struct RetrievedVault<H> {
    pub database: H,
    pub domains: DomainLists,
    pub revision: Revision,
}

/// Result of [`VaultSyncEngine::sync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SyncOutcome {
    /// The local vault is at or ahead of the server revision.
    UpToDate { revision: Revision },
    /// The server vault replaced the local one.
    Updated { previous: Revision, current: Revision },
}

/// Coordinates the local encrypted vault with the server.
///
/// Holds no in-memory vault state: every operation reads and writes the
/// session store, so the engine is a pure function of the store contents and
/// server responses. Callers serialize mutating operations, see
/// [`SyncScheduler`](crate::SyncScheduler).
pub struct VaultSyncEngine<M: Materializer> {
    store: Arc<dyn SessionStore>,
    gateway: Arc<AuthGateway>,
    codec: VaultCodec<M>,
}

impl<M: Materializer> VaultSyncEngine<M> {
    /// Create an engine over a store, a gateway and a codec.
    pub fn new(store: Arc<dyn SessionStore>, gateway: Arc<AuthGateway>, codec: VaultCodec<M>) -> Self {
        Self {
            store,
            gateway,
            codec,
        }
    }

    /// Get the gateway.
    pub fn gateway(&self) -> &Arc<AuthGateway> {
        &self.gateway
    }

    /// Get the codec.
    pub fn codec(&self) -> &VaultCodec<M> {
        &self.codec
    }

    /// Report the lifecycle state.
    pub async fn state(&self) -> Result<EngineState> {
        if self.store.get(StoreKey::AccessToken).await?.is_none() {
            return Ok(EngineState::LoggedOut);
        }

        let blob = self.store.get(StoreKey::VaultBlob).await?;
        let key = self.store.get(StoreKey::DerivedKey).await?;
        Ok(match (blob, key) {
            (Some(_), Some(_)) => EngineState::Unlocked,
            _ => EngineState::Locked,
        })
    }

    /// Persist the provided fields as one batch.
    pub async fn store(&self, update: VaultUpdate) -> Result<()> {
        let entries = update.into_entries()?;
        if entries.is_empty() {
            debug!("Empty vault update, nothing stored");
            return Ok(());
        }

        debug!(fields = entries.len(), "Storing vault update");
        self.store.set_many(entries).await
    }

    /// Decrypt the stored vault.
    ///
    /// Absent domain lists default to empty and an absent revision to zero.
    ///
    /// # Errors
    /// - `VaultUnavailable` if the ciphertext or key is missing
    /// - `DecryptFailure` if the vault cannot be decrypted or loaded
    pub async fn retrieve(&self) -> Result<RetrievedVault<M::Handle>> {
        let blob = self.store.get(StoreKey::VaultBlob).await?;
        let key = self.derived_key().await?;

        let database = self.codec.open(blob.as_deref(), key.as_ref())?;

        Ok(RetrievedVault {
            database,
            domains: self.domains().await?,
            revision: self.local_revision().await?,
        })
    }

    /// Remove every ephemeral key in one batch. The durable tier is kept.
    pub async fn clear(&self) -> Result<()> {
        info!("Clearing local vault state");
        self.store.remove_many(&StoreKey::EPHEMERAL).await
    }

    /// Bring the local vault up to the server revision.
    ///
    /// # Preconditions
    /// - No other mutating engine operation is in flight
    ///
    /// # Postconditions
    /// - The local revision never decreases
    /// - On update, ciphertext, domain lists and revision are replaced together
    ///
    /// # Errors
    /// - `ValidationFailure` if the server or its vault is unusable
    /// - `SessionExpired` if the session could not be refreshed
    pub async fn sync(&self) -> Result<SyncOutcome> {
        let status = self.gateway.get_status().await?;
        if let Some(issue) = validate_status_response(&status, self.gateway.config()) {
            warn!("Server status check failed: {}", issue);
            return Err(issue.into());
        }

        let local = self.local_revision().await?;
        if status.vault_revision <= local {
            debug!(local, server = status.vault_revision, "Vault up to date");
            return Ok(SyncOutcome::UpToDate { revision: local });
        }

        info!(local, server = status.vault_revision, "Fetching newer vault");
        let response = self.gateway.fetch_vault().await?;
        if let Some(issue) = validate_vault_response(&response, self.gateway.config()) {
            warn!("Vault response rejected: {}", issue);
            return Err(issue.into());
        }

        let Some(vault) = response.vault else {
            return Err(ValidationIssue::VaultNotProvisioned.into());
        };
        let Some(blob) = vault.blob.filter(|blob| !blob.is_empty()) else {
            return Err(ValidationIssue::VaultNotProvisioned.into());
        };

        let current = vault.current_revision_number;
        if current <= local {
            warn!(local, current, "Server sent an older vault, keeping local copy");
            return Ok(SyncOutcome::UpToDate { revision: local });
        }

        self.store(VaultUpdate {
            blob: Some(blob),
            derived_key: None,
            domains: Some(DomainLists::new(
                vault.public_email_domain_list,
                vault.private_email_domain_list,
            )),
            revision: Some(current),
        })
        .await?;

        info!(previous = local, current, "Vault updated from server");
        Ok(SyncOutcome::Updated {
            previous: local,
            current,
        })
    }

    /// Seal `handle`, persist the ciphertext and upload it.
    ///
    /// # Postconditions
    /// - The new ciphertext is persisted whether or not the upload succeeds
    /// - The revision changes only when the server accepts the upload
    ///
    /// # Errors
    /// - `VaultUnavailable` if the vault is locked
    /// - `UploadRejected` if the server refuses the upload
    /// - `ServerUnreachable` on transport failure
    pub async fn upload_local(&self, handle: &M::Handle) -> Result<Revision> {
        let key = self
            .derived_key()
            .await?
            .ok_or_else(|| Error::VaultUnavailable("Vault is locked".to_string()))?;

        let blob = self.codec.seal(handle, &key)?;
        self.store.set(StoreKey::VaultBlob, blob.clone()).await?;

        let credentials = handle.credentials()?;
        let domains = self.domains().await?;
        let emails = private_addresses(&credentials, &domains);
        let username = self
            .store
            .get(StoreKey::Username)
            .await?
            .unwrap_or_default();

        let transfer = VaultTransfer::for_update(blob, credentials.len(), username, emails);
        let response = self.gateway.upload_vault(&transfer).await?;

        if !response.is_success() {
            warn!(status = response.status, "Vault upload rejected");
            return Err(Error::UploadRejected(format!(
                "Server rejected vault upload with status {}",
                response.status
            )));
        }

        let revision = response.new_revision_number;
        self.store
            .set(StoreKey::RevisionNumber, encode_value(&revision)?)
            .await?;

        info!(revision, "Vault uploaded");
        Ok(revision)
    }

    /// Upload the stored vault as it is now.
    pub async fn push_local(&self) -> Result<Revision> {
        let retrieved = self.retrieve().await?;
        self.upload_local(&retrieved.database).await
    }

    /// Log out at the user's request.
    pub async fn logout(&self) -> Result<()> {
        self.gateway.logout(LogoutReason::UserRequested).await
    }

    async fn derived_key(&self) -> Result<Option<DerivedKey>> {
        match self.store.get(StoreKey::DerivedKey).await? {
            Some(encoded) => {
                let encoded = Zeroizing::new(encoded);
                Ok(Some(DerivedKey::from_encoded(&encoded)?))
            }
            None => Ok(None),
        }
    }

    async fn domains(&self) -> Result<DomainLists> {
        Ok(DomainLists::new(
            self.domain_list(StoreKey::PublicEmailDomains).await?,
            self.domain_list(StoreKey::PrivateEmailDomains).await?,
        ))
    }

    async fn domain_list(&self, key: StoreKey) -> Result<Vec<String>> {
        match self.store.get(key).await? {
            Some(text) => decode_value(key, &text),
            None => Ok(Vec::new()),
        }
    }

    async fn local_revision(&self) -> Result<Revision> {
        match self.store.get(StoreKey::RevisionNumber).await? {
            Some(text) => decode_value(StoreKey::RevisionNumber, &text),
            None => Ok(0),
        }
    }
}

/// Email addresses on private domains, first occurrence order, no duplicates.
fn private_addresses(credentials: &[Credential], domains: &DomainLists) -> Vec<String> {
    let mut seen = HashSet::new();
    credentials
        .iter()
        .filter_map(|credential| credential.email.as_deref())
        .filter(|email| domains.is_private_address(email))
        .filter(|email| seen.insert(*email))
        .map(str::to_string)
        .collect()
}
