//! Core data types for the multi-account state store

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default PBKDF2 iteration count used when registering new accounts.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;

/// Key derivation function parameters advertised by the server for an account.
///
/// These describe how the master password is turned into the master key and
/// password hash. The actual derivation is performed by the credential
/// cryptography collaborator; this crate only carries the parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kdf", rename_all = "snake_case")]
pub enum KdfParams {
    Pbkdf2 {
        iterations: u32,
    },
    Argon2id {
        iterations: u32,
        memory_mib: u32,
        parallelism: u32,
    },
}

impl KdfParams {
    /// KDF used for newly registered accounts.
    ///
    /// Placeholder pending server-driven registration parameters; the fixed
    /// iteration count is part of the registration wire contract.
    pub fn default_for_registration() -> Self {
        KdfParams::Pbkdf2 {
            iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

/// Immutable identity portion of a locally stored account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    /// Server-assigned user identifier
    pub user_id: String,

    /// Login email
    pub email: String,

    /// KDF parameters for this account's master password
    pub kdf: KdfParams,
}

/// Bearer credentials for a locally stored account.
///
/// The access token is rewritten by the token refresh path and by login;
/// nothing else mutates it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// One locally known account: profile plus current tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub profile: AccountProfile,
    pub tokens: AccountTokens,
}

/// The single source of truth for "who is logged in".
///
/// Invariant: `active_user_id` is always a key of `accounts`. The fully
/// logged-out state is represented as `Option<UserState>` being `None`, so an
/// empty `accounts` map never exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    /// User id of the active account
    pub active_user_id: String,

    /// All locally stored accounts, keyed by user id
    pub accounts: BTreeMap<String, Account>,
}

impl UserState {
    /// Create a state holding a single, active account.
    pub fn new(account: Account) -> Self {
        let active_user_id = account.profile.user_id.clone();
        let mut accounts = BTreeMap::new();
        accounts.insert(active_user_id.clone(), account);
        Self {
            active_user_id,
            accounts,
        }
    }

    /// Merge an account into the state, making it active.
    ///
    /// Replaces any existing account with the same user id.
    pub fn with_account(mut self, account: Account) -> Self {
        self.active_user_id = account.profile.user_id.clone();
        self.accounts
            .insert(account.profile.user_id.clone(), account);
        self
    }

    /// The currently active account.
    pub fn active_account(&self) -> Option<&Account> {
        self.accounts.get(&self.active_user_id)
    }
}
