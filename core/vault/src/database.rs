//! Database collaborator contract.

use vaultsync_common::Result;

use crate::document::Credential;

/// A live, decrypted vault database.
pub trait VaultHandle: Send + Sync {
    /// Serialize the whole database to bytes.
    ///
    /// Exporting an unchanged handle twice must yield identical bytes.
    fn export_to_bytes(&self) -> Result<Vec<u8>>;

    /// All credentials stored in the database.
    fn credentials(&self) -> Result<Vec<Credential>>;
}

/// Builds live database handles from exported bytes.
pub trait Materializer: Send + Sync {
    /// Handle type produced by this materializer.
    type Handle: VaultHandle;

    /// Load a database from bytes produced by [`VaultHandle::export_to_bytes`].
    fn load_from_bytes(&self, bytes: &[u8]) -> Result<Self::Handle>;
}
