//! Error types for the account store
use thiserror::Error;

use crate::persist::PersistError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No stored account for user: {user_id}")]
    UnknownAccount { user_id: String },

    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl StoreError {
    /// Check if this error refers to a user id with no locally stored account.
    pub fn is_unknown_account(&self) -> bool {
        matches!(self, StoreError::UnknownAccount { .. })
    }
}
