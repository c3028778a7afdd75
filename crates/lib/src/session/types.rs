//! Result and derived-state types for the session coordinator
//!
//! These are closed sum types: callers branch on the discriminant, and
//! expected control-flow outcomes (CAPTCHA demanded, breached password) are
//! variants rather than errors.

use crate::store::UserState;

/// Derived authentication state.
///
/// Computed from the latest [`UserState`], never stored independently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthState {
    /// The account store has not been seeded from persistence yet
    Uninitialized,

    /// No active account
    Unauthenticated,

    /// An account is active and its access token is available
    Authenticated { access_token: String },
}

impl AuthState {
    /// Recompute the authentication state from a user state.
    pub fn derive(state: Option<&UserState>) -> Self {
        match state.and_then(|s| s.active_account()) {
            Some(account) => AuthState::Authenticated {
                access_token: account.tokens.access_token.clone(),
            },
            None => AuthState::Unauthenticated,
        }
    }
}

/// Outcome of one login attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginResult {
    /// Logged in; the new account is active and its vault unlock was requested
    Success,

    /// CAPTCHA completion required before the attempt can succeed
    CaptchaRequired { site_key: String },

    /// The attempt failed. `message` carries the server's rejection text when
    /// one exists; transport and hashing failures carry `None` by design.
    Error { message: Option<String> },
}

/// Outcome of one registration attempt.
///
/// Registration never mutates local state; a successful registration is
/// followed by an explicit login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegisterResult {
    Success {
        /// Token allowing the follow-up login to skip CAPTCHA
        captcha_bypass_token: Option<String>,
    },

    CaptchaRequired { site_key: String },

    /// The chosen password appears in known breach corpora
    DataBreachFound,

    Error { message: Option<String> },
}

/// Completion of an out-of-process CAPTCHA challenge.
///
/// Delivered through the transient multicast stream to resume an in-flight
/// login; never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptchaTokenResult {
    Success { token: String },
    Cancelled,
}

/// Five-level password strength classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PasswordStrength {
    Weakest,
    Weak,
    Fair,
    Good,
    Strong,
}

impl PasswordStrength {
    /// Classify a password by length.
    ///
    /// Thresholds: ≤3 is weakest, then ≤6, ≤9, ≤11, else strongest. A
    /// placeholder classifier pending a richer scoring collaborator; the
    /// thresholds are part of the compatibility contract.
    pub fn classify(password: &str) -> Self {
        match password.chars().count() {
            0..=3 => PasswordStrength::Weakest,
            4..=6 => PasswordStrength::Weak,
            7..=9 => PasswordStrength::Fair,
            10..=11 => PasswordStrength::Good,
            _ => PasswordStrength::Strong,
        }
    }

    /// Numeric score, 0 (weakest) through 4 (strongest).
    pub fn score(&self) -> u8 {
        *self as u8
    }
}
