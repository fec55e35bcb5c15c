//! Local session teardown on logout.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use vaultsync_common::Result;
use vaultsync_storage::{SessionStore, StoreKey};

/// Why the session is being torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user asked to log out.
    UserRequested,
    /// The refresh token was rejected or the server reported the session expired.
    SessionExpired,
}

impl fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogoutReason::UserRequested => f.write_str("user logout"),
            LogoutReason::SessionExpired => f.write_str("session expired"),
        }
    }
}

/// Local teardown run after every logout.
#[async_trait]
pub trait LogoutHook: Send + Sync {
    /// Remove all local session state.
    async fn teardown(&self, reason: LogoutReason) -> Result<()>;
}

/// Teardown that clears both storage tiers in a single batch.
pub struct StoreTeardown {
    store: Arc<dyn SessionStore>,
}

impl StoreTeardown {
    /// Create a teardown over `store`.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl LogoutHook for StoreTeardown {
    async fn teardown(&self, reason: LogoutReason) -> Result<()> {
        info!("Clearing local session ({})", reason);
        self.store.remove_many(&StoreKey::ALL).await
    }
}
