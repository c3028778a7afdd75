//! Vault engine collaborator seam
//!
//! Vault unlocking, locking, and data synchronization are implemented
//! elsewhere; the session coordinator drives them through [`VaultHandle`].

use async_trait::async_trait;
use thiserror::Error;

/// Failure inside the vault engine.
#[derive(Error, Debug)]
#[error("Vault operation failed: {reason}")]
pub struct VaultError {
    pub reason: String,
}

/// Operations the session coordinator invokes on the vault engine.
#[async_trait]
pub trait VaultHandle: Send + Sync {
    /// Unlock a user's vault with the keys returned by the identity service.
    async fn unlock(
        &self,
        user_id: &str,
        user_key: &str,
        private_key: &str,
    ) -> Result<(), VaultError>;

    /// Lock a user's vault.
    async fn lock(&self, user_id: &str) -> Result<(), VaultError>;

    /// Drop any in-memory unlocked vault data for the active session.
    async fn clear_unlocked_data(&self) -> Result<(), VaultError>;

    /// Pull the user's vault data from the server.
    async fn sync(&self, user_id: &str) -> Result<(), VaultError>;
}
