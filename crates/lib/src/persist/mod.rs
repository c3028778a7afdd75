//!
//! Persistence collaborator seam.
//!
//! The application provides an implementation of [`SettingsStore`] backed by
//! its on-disk key/value layer. All values are read and written whole; there
//! are no partial-field updates. The trait is deliberately synchronous so the
//! blocking token refresh path can persist its result without touching the
//! async scheduler.

use thiserror::Error;

use crate::{config::ServerConfig, store::UserState};

pub mod memory;

pub use memory::InMemory;

/// Errors surfaced by a [`SettingsStore`] implementation.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Persistence backend failure: {reason}")]
    Backend { reason: String },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Whole-value key/value persistence used by the store and the config cache.
///
/// Setters take `Option` values; `None` clears the stored entry.
pub trait SettingsStore: Send + Sync {
    /// Read the persisted user state.
    fn user_state(&self) -> Result<Option<UserState>, PersistError>;

    /// Replace the persisted user state.
    fn set_user_state(&self, state: Option<&UserState>) -> Result<(), PersistError>;

    /// Read the persisted server configuration.
    fn server_config(&self) -> Result<Option<ServerConfig>, PersistError>;

    /// Replace the persisted server configuration.
    fn set_server_config(&self, config: Option<&ServerConfig>) -> Result<(), PersistError>;

    /// Read a user's encryption key.
    fn user_key(&self, user_id: &str) -> Result<Option<String>, PersistError>;

    /// Store or clear a user's encryption key.
    fn set_user_key(&self, user_id: &str, key: Option<&str>) -> Result<(), PersistError>;

    /// Read a user's private key.
    fn private_key(&self, user_id: &str) -> Result<Option<String>, PersistError>;

    /// Store or clear a user's private key.
    fn set_private_key(&self, user_id: &str, key: Option<&str>) -> Result<(), PersistError>;

    /// Read the remembered login email.
    fn remembered_email(&self) -> Result<Option<String>, PersistError>;

    /// Store or clear the remembered login email.
    fn set_remembered_email(&self, email: Option<&str>) -> Result<(), PersistError>;

    /// Read the locally generated device identifier.
    fn device_id(&self) -> Result<Option<String>, PersistError>;

    /// Store the locally generated device identifier.
    fn set_device_id(&self, device_id: &str) -> Result<(), PersistError>;
}
