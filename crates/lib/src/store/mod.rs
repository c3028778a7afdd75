//!
//! Durable, single-writer record of all locally known accounts.
//!
//! [`AccountStore`] owns the [`UserState`] value: it is seeded once from the
//! persistence collaborator, every mutation goes through the whole-value
//! [`write`](AccountStore::write), and every written value is published to a
//! replay-latest stream so observers always see a fully-formed state. Partial
//! field updates are deliberately not exposed; this is the concurrency safety
//! net in the absence of fine-grained locking.
//!
//! The store also owns the lifecycle of per-user secret material (user
//! encryption key, private key). Secrets live in the persistence collaborator
//! keyed by user id and are cleared whenever the corresponding account is
//! removed.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::{Result, persist::SettingsStore};

pub mod errors;
pub mod types;

pub use errors::StoreError;
pub use types::{
    Account, AccountProfile, AccountTokens, DEFAULT_PBKDF2_ITERATIONS, KdfParams, UserState,
};

/// Outcome of removing an account from the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountRemoval {
    /// Whether the removed account was the active one
    pub was_active: bool,
}

/// Internal state for AccountStore
struct StoreInternal {
    /// Persistence collaborator for the durable copy of state and secrets
    persist: Arc<dyn SettingsStore>,
    /// Latest written state; the sender side of the replay-latest stream
    state: watch::Sender<Option<UserState>>,
}

/// Single-writer store of all locally known accounts and which one is active.
///
/// Cheap-to-clone handle around `Arc<StoreInternal>`.
#[derive(Clone)]
pub struct AccountStore {
    inner: Arc<StoreInternal>,
}

impl std::fmt::Debug for AccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountStore")
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

impl AccountStore {
    /// Load the store, seeding in-memory state from the persisted value.
    ///
    /// This is the single initialization point; construct it once (normally
    /// via [`SessionContext::new`](crate::SessionContext::new)) and pass
    /// clones to dependents.
    pub fn load(persist: Arc<dyn SettingsStore>) -> Result<Self> {
        let seeded = persist.user_state()?;
        debug!(
            accounts = seeded.as_ref().map(|s| s.accounts.len()).unwrap_or(0),
            "account store seeded from persistence"
        );
        let (state, _) = watch::channel(seeded);
        Ok(Self {
            inner: Arc::new(StoreInternal { persist, state }),
        })
    }

    /// The latest written state, `None` when fully logged out.
    pub fn user_state(&self) -> Option<UserState> {
        self.inner.state.borrow().clone()
    }

    /// User id of the active account, if any.
    pub fn active_user_id(&self) -> Option<String> {
        self.inner.state.borrow().as_ref().map(|s| s.active_user_id.clone())
    }

    /// The active account, if any.
    pub fn active_account(&self) -> Option<Account> {
        self.inner
            .state
            .borrow()
            .as_ref()
            .and_then(|s| s.active_account().cloned())
    }

    /// Replace the entire state atomically.
    ///
    /// This is the only mutation primitive. The value is persisted first and
    /// then published, so stream observers never see a state that was not
    /// durably written.
    pub fn write(&self, state: Option<UserState>) -> Result<()> {
        self.inner.persist.set_user_state(state.as_ref())?;
        self.inner.state.send_replace(state);
        Ok(())
    }

    /// Subscribe to state changes; the latest value is replayed immediately.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserState>> {
        self.inner.state.subscribe()
    }

    /// Make a stored account the active one.
    pub fn switch_account(&self, user_id: &str) -> Result<()> {
        let mut state = self.user_state().ok_or_else(|| StoreError::UnknownAccount {
            user_id: user_id.to_string(),
        })?;
        if !state.accounts.contains_key(user_id) {
            return Err(StoreError::UnknownAccount {
                user_id: user_id.to_string(),
            }
            .into());
        }
        state.active_user_id = user_id.to_string();
        self.write(Some(state))?;
        info!(user_id, "switched active account");
        Ok(())
    }

    /// Remove an account and clear its stored secret material.
    ///
    /// Applies the removal algorithm: if the removed account was active and
    /// others remain, the first remaining entry is promoted (BTreeMap order,
    /// so the lexicographically smallest user id — stable across runs). When
    /// the last account is removed the state becomes `None`.
    ///
    /// Returns `None` without touching anything when `user_id` has no stored
    /// account.
    pub fn remove_account(&self, user_id: &str) -> Result<Option<AccountRemoval>> {
        let Some(mut state) = self.user_state() else {
            return Ok(None);
        };
        if state.accounts.remove(user_id).is_none() {
            return Ok(None);
        }

        let was_active = state.active_user_id == user_id;
        let next = if state.accounts.is_empty() {
            None
        } else {
            if was_active {
                // Promote the first remaining entry.
                state.active_user_id = state
                    .accounts
                    .keys()
                    .next()
                    .cloned()
                    .unwrap_or_default();
            }
            Some(state)
        };

        self.write(next)?;
        self.clear_user_secrets(user_id)?;
        info!(user_id, was_active, "removed account");
        Ok(Some(AccountRemoval { was_active }))
    }

    // === Per-user secret material ===
    //
    // Keyed independently from UserState but logically owned by the same
    // account lifecycle.

    /// Store the user encryption key and private key for a user.
    pub fn store_user_secrets(
        &self,
        user_id: &str,
        user_key: &str,
        private_key: &str,
    ) -> Result<()> {
        self.inner.persist.set_user_key(user_id, Some(user_key))?;
        self.inner.persist.set_private_key(user_id, Some(private_key))?;
        Ok(())
    }

    /// Retrieve the stored user encryption key for a user.
    pub fn user_key(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.inner.persist.user_key(user_id)?)
    }

    /// Retrieve the stored private key for a user.
    pub fn private_key(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.inner.persist.private_key(user_id)?)
    }

    fn clear_user_secrets(&self, user_id: &str) -> Result<()> {
        self.inner.persist.set_user_key(user_id, None)?;
        self.inner.persist.set_private_key(user_id, None)?;
        Ok(())
    }

    // === Remembered email ===

    /// Email remembered from the last successful login.
    pub fn remembered_email(&self) -> Result<Option<String>> {
        Ok(self.inner.persist.remembered_email()?)
    }

    /// Remember (or forget, with `None`) the login email.
    pub fn set_remembered_email(&self, email: Option<&str>) -> Result<()> {
        Ok(self.inner.persist.set_remembered_email(email)?)
    }
}
