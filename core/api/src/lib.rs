//! Authenticated server access for VaultSync.
//!
//! This module provides:
//! - Bearer-authenticated requests with transparent, single-flight token refresh
//! - The logout cascade (best-effort revoke, then local teardown)
//! - Server health probing that degrades instead of failing
//! - Pure validation of status and vault responses
//!
//! HTTP itself sits behind the [`HttpTransport`] seam.

pub mod config;
pub mod gateway;
pub mod logout;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod transport;
pub mod types;
pub mod validate;

pub use config::ApiConfig;
pub use gateway::AuthGateway;
pub use logout::{LogoutHook, LogoutReason, StoreTeardown};
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockTransport;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, ReqwestTransport};
pub use types::{
    AuthLogEntry, SessionDescriptor, StatusResponse, UploadResponse, VaultPayload,
    VaultResponse, VaultStatus, VaultTransfer,
};
pub use validate::{validate_status_response, validate_vault_response};
