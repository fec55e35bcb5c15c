//! Wire types of the server API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vaultsync_common::Revision;

/// Server version reported when the server cannot be reached.
pub const UNAVAILABLE_SERVER_VERSION: &str = "0.0.0";

/// Response of `GET Auth/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub client_version_supported: bool,
    pub server_version: String,
    #[serde(default)]
    pub vault_revision: Revision,
}

impl StatusResponse {
    /// Degraded response returned when the health probe cannot reach the server.
    pub fn unavailable() -> Self {
        Self {
            client_version_supported: true,
            server_version: UNAVAILABLE_SERVER_VERSION.to_string(),
            vault_revision: 0,
        }
    }

    /// Check whether this is the degraded response.
    pub fn is_unavailable(&self) -> bool {
        self.server_version == UNAVAILABLE_SERVER_VERSION
    }
}

/// Body of `POST Auth/refresh` and `POST Auth/revoke`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenBody<'a> {
    pub token: &'a str,
    pub refresh_token: &'a str,
}

/// Response of `POST Auth/refresh`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshResponse {
    pub token: String,
    pub refresh_token: String,
}

/// Server-side vault state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum VaultStatus {
    Ready,
    MergeRequired,
    Unknown(u8),
}

impl From<u8> for VaultStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => VaultStatus::Ready,
            1 => VaultStatus::MergeRequired,
            other => VaultStatus::Unknown(other),
        }
    }
}

impl From<VaultStatus> for u8 {
    fn from(status: VaultStatus) -> Self {
        match status {
            VaultStatus::Ready => 0,
            VaultStatus::MergeRequired => 1,
            VaultStatus::Unknown(code) => code,
        }
    }
}

/// Encrypted vault as held by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultPayload {
    #[serde(default)]
    pub blob: Option<String>,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub public_email_domain_list: Vec<String>,
    #[serde(default)]
    pub private_email_domain_list: Vec<String>,
    #[serde(default)]
    pub current_revision_number: Revision,
}

/// Response of `GET Vault`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultResponse {
    pub status: VaultStatus,
    #[serde(default)]
    pub vault: Option<VaultPayload>,
}

/// Body of `POST Vault`.
///
/// On update the server only reads the blob and the upload metadata; the
/// remaining fields are sent empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultTransfer {
    pub blob: String,
    pub credentials_count: usize,
    pub username: String,
    pub email_address_list: Vec<String>,
    pub public_email_domain_list: Vec<String>,
    pub private_email_domain_list: Vec<String>,
    pub current_revision_number: Revision,
}

impl VaultTransfer {
    /// Build an update transfer object.
    pub fn for_update(
        blob: String,
        credentials_count: usize,
        username: String,
        email_address_list: Vec<String>,
    ) -> Self {
        Self {
            blob,
            credentials_count,
            username,
            email_address_list,
            ..Self::default()
        }
    }
}

/// Response of `POST Vault`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub status: u8,
    #[serde(default)]
    pub new_revision_number: Revision,
}

impl UploadResponse {
    /// Status code for an accepted upload.
    pub const SUCCESS: u8 = 0;

    /// Check whether the server accepted the upload.
    pub fn is_success(&self) -> bool {
        self.status == Self::SUCCESS
    }
}

/// An active login session on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
    pub id: String,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_activity_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_current: bool,
}

/// A recorded authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthLogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub success: bool,
}
