//! Error types for the session coordinator
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Operation requires a logged-in account")]
    NotLoggedIn,

    #[error("Remote service failure: {message}")]
    Network { message: String },

    #[error("Credential crypto failure: {reason}")]
    Crypto { reason: String },
}

impl SessionError {
    /// Check if this error requires the caller to establish a session first.
    pub fn is_not_logged_in(&self) -> bool {
        matches!(self, SessionError::NotLoggedIn)
    }
}
