//!
//! Latchkey: the session and server-configuration core of a multi-account
//! credential vault client.
//!
//! ## Core Concepts
//!
//! * **`SessionContext` (`context::SessionContext`)**: The single wiring point. Constructed once
//!   at startup with the external collaborators, it owns the account store, the server
//!   configuration cache, and the session coordinator.
//! * **`AccountStore` (`store::AccountStore`)**: Durable, single-writer record of all locally
//!   known accounts and which one is active. The whole-value `write` is the only mutation
//!   primitive.
//! * **`SessionCoordinator` (`session::SessionCoordinator`)**: Orchestrates login, registration,
//!   logout, account switching, account deletion, and the blocking token refresh.
//! * **`ConfigCache` (`config::ConfigCache`)**: TTL-gated cache of server capability data,
//!   refreshed on demand or on environment change.
//! * **Collaborator traits (`api`, `crypto`, `persist`, `vault`)**: Narrow seams for the HTTP
//!   clients, the credential cryptography provider, the on-disk key/value store, and the vault
//!   engine. Latchkey performs no cryptography and no transport itself.
//!
//! Dependent subsystems observe derived state through replay-latest streams: `UserState` and
//! `AuthState` from the coordinator, `ServerConfig` from the cache, plus the transient
//! CAPTCHA-completion broadcast.

pub mod api;
pub mod clock;
pub mod config;
pub mod context;
pub mod crypto;
pub mod persist;
pub mod session;
pub mod store;
pub mod vault;

pub use clock::{Clock, SystemClock};
pub use context::{Collaborators, SessionContext};

#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;

/// Result type used throughout the Latchkey library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Latchkey library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured session errors from the session module
    #[error(transparent)]
    Session(#[from] session::SessionError),

    /// Structured account-store errors from the store module
    #[error(transparent)]
    Store(#[from] store::StoreError),

    /// Structured configuration-cache errors from the config module
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// Structured persistence errors from the persist module
    #[error(transparent)]
    Persist(#[from] persist::PersistError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Session(_) => "session",
            Error::Store(_) => "store",
            Error::Config(_) => "config",
            Error::Persist(_) => "persist",
        }
    }

    /// Check if this error indicates an operation that requires a logged-in
    /// account was attempted without one.
    pub fn is_not_logged_in(&self) -> bool {
        matches!(self, Error::Session(session::SessionError::NotLoggedIn))
    }

    /// Check if this error refers to a user id with no locally stored account.
    pub fn is_unknown_account(&self) -> bool {
        matches!(self, Error::Store(store::StoreError::UnknownAccount { .. }))
    }

    /// Check if this error was caused by a remote service or transport failure.
    pub fn is_network_error(&self) -> bool {
        match self {
            Error::Session(err) => matches!(err, session::SessionError::Network { .. }),
            Error::Config(err) => err.is_fetch_error(),
            _ => false,
        }
    }

    /// Check if this error originated in the persistence collaborator.
    pub fn is_persistence_error(&self) -> bool {
        match self {
            Error::Persist(_) => true,
            Error::Store(err) => matches!(err, store::StoreError::Persist(_)),
            Error::Config(err) => matches!(err, config::ConfigError::Persist(_)),
            Error::Session(_) => false,
        }
    }
}
