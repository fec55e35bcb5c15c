//! VaultSync Sync Engine
//!
//! This module keeps the local encrypted vault in step with the server:
//! - Local vault state in the session store (store, retrieve, clear)
//! - Revision-based download of newer server vaults
//! - Sealing and upload of local changes
//! - Typed request dispatch for host applications
//! - A scheduler that serializes requests and runs periodic syncs

pub mod engine;
pub mod request;
pub mod scheduler;

// Re-export main types
pub use engine::{EngineState, RetrievedVault, SyncOutcome, VaultSyncEngine, VaultUpdate};
pub use request::{Request, Response, StorePayload, VaultView};
pub use scheduler::{SchedulerConfig, SyncScheduler, SyncSchedulerHandle};
