//! Error types for the server configuration cache
use thiserror::Error;

use crate::persist::PersistError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config fetch failed: {message}")]
    Fetch { message: String },

    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl ConfigError {
    /// Check if this error was caused by the remote config fetch.
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, ConfigError::Fetch { .. })
    }
}
