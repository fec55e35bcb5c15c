//! Compatibility checks on server responses.

use vaultsync_common::ValidationIssue;

use crate::config::ApiConfig;
use crate::types::{StatusResponse, VaultResponse, VaultStatus};

/// Check a status response for problems that stop the client from syncing.
///
/// Returns `None` when the server is usable.
pub fn validate_status_response(
    status: &StatusResponse,
    config: &ApiConfig,
) -> Option<ValidationIssue> {
    if status.is_unavailable() {
        return Some(ValidationIssue::ServerUnavailable);
    }

    if !status.client_version_supported {
        return Some(ValidationIssue::ClientVersionUnsupported);
    }

    match major_version(&status.server_version) {
        Some(major) if major == config.supported_server_major => None,
        _ => Some(ValidationIssue::ServerVersionUnsupported),
    }
}

/// Check a vault response for problems that stop the client from opening it.
///
/// Returns `None` when the vault can be stored and opened.
pub fn validate_vault_response(
    response: &VaultResponse,
    config: &ApiConfig,
) -> Option<ValidationIssue> {
    match response.status {
        VaultStatus::Ready => {}
        VaultStatus::MergeRequired => return Some(ValidationIssue::VaultMergeRequired),
        VaultStatus::Unknown(_) => return Some(ValidationIssue::VaultNotReady),
    }

    let Some(vault) = &response.vault else {
        return Some(ValidationIssue::VaultNotProvisioned);
    };

    if vault.blob.as_deref().map_or(true, str::is_empty) {
        return Some(ValidationIssue::VaultNotProvisioned);
    }

    if vault.version > config.max_vault_version {
        return Some(ValidationIssue::VaultVersionUnsupported);
    }

    None
}

fn major_version(version: &str) -> Option<u64> {
    version.trim().split('.').next()?.parse().ok()
}
