//! Document-backed vault database.
//!
//! The decrypted vault is a single JSON document. Ordered maps keep the
//! exported bytes deterministic, so exporting an unchanged handle always
//! yields the same bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use vaultsync_common::{Error, Result, ValidationIssue};
use crate::database::{Materializer, VaultHandle};

/// Newest document schema this client understands.
pub const SCHEMA_VERSION: u32 = 1;

/// A stored credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: Uuid,
    pub service_name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// Create a credential for a service with a fresh id.
    pub fn new(service_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            service_name: service_name.into(),
            username: None,
            email: None,
            password: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the username.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("service_name", &self.service_name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

/// The decrypted vault database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultDocument {
    schema_version: u32,
    #[serde(default)]
    credentials: BTreeMap<String, Credential>,
    #[serde(default)]
    settings: BTreeMap<String, String>,
}

impl VaultDocument {
    /// Create an empty database at the current schema version.
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            credentials: BTreeMap::new(),
            settings: BTreeMap::new(),
        }
    }

    /// Schema version the document was written with.
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Insert a new credential.
    ///
    /// # Errors
    /// - Returns error if a credential with the same id exists
    pub fn add_credential(&mut self, credential: Credential) -> Result<Uuid> {
        let id = credential.id;
        let key = id.to_string();
        if self.credentials.contains_key(&key) {
            return Err(Error::InvalidInput(format!(
                "Credential '{}' already exists",
                id
            )));
        }
        self.credentials.insert(key, credential);
        Ok(id)
    }

    /// Replace an existing credential, stamping its update time.
    pub fn update_credential(&mut self, mut credential: Credential) -> Result<()> {
        let key = credential.id.to_string();
        let Some(existing) = self.credentials.get(&key) else {
            return Err(Error::NotFound(format!(
                "Credential '{}' not found",
                credential.id
            )));
        };
        credential.created_at = existing.created_at;
        credential.updated_at = Utc::now();
        self.credentials.insert(key, credential);
        Ok(())
    }

    /// Remove a credential by id.
    pub fn remove_credential(&mut self, id: Uuid) -> Result<Credential> {
        self.credentials
            .remove(&id.to_string())
            .ok_or_else(|| Error::NotFound(format!("Credential '{}' not found", id)))
    }

    /// Get a credential by id.
    pub fn credential(&self, id: Uuid) -> Option<&Credential> {
        self.credentials.get(&id.to_string())
    }

    /// Iterate over credentials in id order.
    pub fn iter_credentials(&self) -> impl Iterator<Item = &Credential> {
        self.credentials.values()
    }

    /// Number of stored credentials.
    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }

    /// Read a setting.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// Write a setting.
    pub fn set_setting(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.settings.insert(key.into(), value.into());
    }

    /// Remove a setting, returning its previous value.
    pub fn remove_setting(&mut self, key: &str) -> Option<String> {
        self.settings.remove(key)
    }
}

impl Default for VaultDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl VaultHandle for VaultDocument {
    fn export_to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| Error::Serialization(format!("Failed to export vault: {}", e)))
    }

    fn credentials(&self) -> Result<Vec<Credential>> {
        Ok(self.credentials.values().cloned().collect())
    }
}

/// Materializes [`VaultDocument`] handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentMaterializer;

impl Materializer for DocumentMaterializer {
    type Handle = VaultDocument;

    fn load_from_bytes(&self, bytes: &[u8]) -> Result<VaultDocument> {
        let document: VaultDocument = serde_json::from_slice(bytes)
            .map_err(|e| Error::Serialization(format!("Failed to load vault: {}", e)))?;

        if document.schema_version > SCHEMA_VERSION {
            return Err(ValidationIssue::VaultVersionUnsupported.into());
        }

        debug!(
            credentials = document.credential_count(),
            "Loaded vault document"
        );
        Ok(document)
    }
}
