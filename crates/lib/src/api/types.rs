//! Wire types for the network capability seams

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::KdfParams;

/// Access/refresh token pair returned by token exchange and refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Profile fields returned alongside a successful token exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProfile {
    pub user_id: String,
    pub email: String,
}

/// Full payload of a successful token exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityTokens {
    pub tokens: TokenPair,

    /// Encrypted user (symmetric) key, passed through to the vault
    pub user_key: String,

    /// Encrypted private key, passed through to the vault
    pub private_key: String,

    pub profile: IdentityProfile,
}

/// Outcome of one token exchange call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenResponse {
    /// Credentials accepted
    Success(IdentityTokens),

    /// The service demands CAPTCHA completion before issuing tokens
    CaptchaRequired { site_key: String },

    /// Credentials rejected with a server-provided message
    Invalid { message: String },
}

/// Registration submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub master_password_hash: String,
    pub master_password_hint: Option<String>,
    pub captcha_token: Option<String>,
    pub public_key: String,
    pub encrypted_private_key: String,
    pub kdf: KdfParams,
}

/// Outcome of one registration call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegisterResponse {
    /// Registration accepted
    Success {
        /// Token allowing the follow-up login to skip CAPTCHA
        captcha_bypass_token: Option<String>,
    },

    /// CAPTCHA completion demanded; keys for the available challenges
    CaptchaRequired { site_keys: Vec<String> },

    /// Server-side validation rejected the submission
    Invalid {
        /// Messages keyed by field name
        validation_errors: BTreeMap<String, Vec<String>>,
        message: Option<String>,
    },

    /// Any other remote failure
    Error { message: Option<String> },
}
