//!
//! Network capability seams.
//!
//! Each remote capability the session core consumes is a narrow trait the
//! application implements over its wire-level HTTP clients: pre-login KDF
//! lookup and token exchange ([`AuthApi`]), registration and account deletion
//! ([`AccountsApi`]), breach lookup ([`BreachApi`]), and config fetch
//! ([`ConfigApi`]). Latchkey owns no transport; implementations decide
//! endpoints, retries, and serialization of the wire formats.

use async_trait::async_trait;
use thiserror::Error;

use crate::{config::ServerData, store::KdfParams};

pub mod types;

pub use types::{
    IdentityProfile, IdentityTokens, RegisterRequest, RegisterResponse, TokenPair, TokenResponse,
};

/// Transport/remote errors surfaced by the capability traits.
///
/// The session coordinator collapses these into opaque result variants; the
/// distinction below exists for logging and for implementations.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },
}

/// Identity service: pre-login KDF resolution, token exchange, token refresh.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Resolve the KDF parameters registered for an email.
    async fn prelogin(&self, email: &str) -> Result<KdfParams, ApiError>;

    /// Exchange hashed credentials for tokens.
    ///
    /// The password hash is the locally derived master password hash; the
    /// plaintext password never crosses this seam.
    async fn request_token(
        &self,
        device_id: &str,
        email: &str,
        password_hash: &str,
        captcha_token: Option<&str>,
    ) -> Result<TokenResponse, ApiError>;

    /// Exchange a refresh token for a new token pair.
    ///
    /// **Blocking call.** This method executes synchronously on the caller's
    /// thread so it can serve a request-retry interceptor that cannot
    /// suspend. Never call it from an async context that could deadlock
    /// waiting on itself; inside a runtime, use `spawn_blocking`.
    fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, ApiError>;
}

/// Account management service: registration and deletion.
#[async_trait]
pub trait AccountsApi: Send + Sync {
    /// Submit a registration.
    async fn register(&self, request: RegisterRequest) -> Result<RegisterResponse, ApiError>;

    /// Delete the account authenticated by the active session.
    ///
    /// `password_hash` re-proves ownership of the master password.
    async fn delete_account(&self, password_hash: &str) -> Result<(), ApiError>;
}

/// Password breach lookup service.
#[async_trait]
pub trait BreachApi: Send + Sync {
    /// Whether the candidate password appears in known breach corpora.
    async fn is_password_breached(&self, password: &str) -> Result<bool, ApiError>;
}

/// Server configuration endpoint.
#[async_trait]
pub trait ConfigApi: Send + Sync {
    /// Fetch the current capability/config payload.
    async fn fetch_config(&self) -> Result<ServerData, ApiError>;
}
