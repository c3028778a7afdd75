//!
//! Authentication session coordinator.
//!
//! [`SessionCoordinator`] orchestrates login, registration, logout, account
//! switching, account deletion, and the blocking token refresh. It composes
//! the account store with the crypto/network/vault collaborators; on success
//! it mutates the store, and the store's publication drives the derived
//! [`AuthState`] stream that dependent subsystems observe.
//!
//! Error policy: downstream network and crypto failures inside login and
//! registration are collapsed into the opaque `Error` result variants; CAPTCHA
//! demands and breach findings are ordinary result variants, not failures.
//! Illegal-state conditions (refreshing tokens for an unknown user, deleting
//! without an active account) surface as [`SessionError::NotLoggedIn`].

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    Result,
    api::{
        AccountsApi, AuthApi, BreachApi, IdentityTokens, RegisterRequest, RegisterResponse,
        TokenPair, TokenResponse,
    },
    crypto::CredentialCrypto,
    persist::SettingsStore,
    store::{Account, AccountProfile, AccountStore, AccountTokens, KdfParams, UserState},
    vault::VaultHandle,
};

pub mod errors;
pub mod types;

pub use errors::SessionError;
pub use types::{AuthState, CaptchaTokenResult, LoginResult, PasswordStrength, RegisterResult};

/// Shown when the server demands a CAPTCHA but advertises no challenge key.
const CAPTCHA_FALLBACK_MESSAGE: &str = "Captcha required.";
/// Shown when a rejected registration carries no usable message.
const REGISTRATION_FALLBACK_MESSAGE: &str = "Registration failed.";

/// Internal state for SessionCoordinator
struct SessionInternal {
    store: AccountStore,
    persist: Arc<dyn SettingsStore>,
    auth_api: Arc<dyn AuthApi>,
    accounts_api: Arc<dyn AccountsApi>,
    breach_api: Arc<dyn BreachApi>,
    crypto: Arc<dyn CredentialCrypto>,
    vault: Arc<dyn VaultHandle>,

    /// Live subscribers of the transient CAPTCHA completion stream
    captcha_subscribers: Mutex<Vec<mpsc::UnboundedSender<CaptchaTokenResult>>>,

    /// Receiver prototype for the derived auth-state stream
    auth_rx: watch::Receiver<AuthState>,
}

/// Orchestrates the authentication lifecycle across all stored accounts.
///
/// Cheap-to-clone handle around `Arc<SessionInternal>`. Construct once
/// (normally via [`SessionContext::new`](crate::SessionContext::new)) inside a
/// tokio runtime; construction spawns the auth-state derivation task.
#[derive(Clone)]
pub struct SessionCoordinator {
    inner: Arc<SessionInternal>,
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("auth_state", &self.auth_state())
            .finish()
    }
}

impl SessionCoordinator {
    /// Wire the coordinator to its collaborators and start the auth-state
    /// derivation task.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: AccountStore,
        persist: Arc<dyn SettingsStore>,
        auth_api: Arc<dyn AuthApi>,
        accounts_api: Arc<dyn AccountsApi>,
        breach_api: Arc<dyn BreachApi>,
        crypto: Arc<dyn CredentialCrypto>,
        vault: Arc<dyn VaultHandle>,
    ) -> Self {
        let (auth_tx, auth_rx) = watch::channel(AuthState::Uninitialized);
        // The store is already seeded, so the placeholder is replaced before
        // any subscriber can observe it through this coordinator.
        auth_tx.send_replace(AuthState::derive(store.user_state().as_ref()));

        let mut state_rx = store.subscribe();
        tokio::spawn(async move {
            while state_rx.changed().await.is_ok() {
                let derived = AuthState::derive(state_rx.borrow_and_update().as_ref());
                auth_tx.send_replace(derived);
            }
        });

        Self {
            inner: Arc::new(SessionInternal {
                store,
                persist,
                auth_api,
                accounts_api,
                breach_api,
                crypto,
                vault,
                captcha_subscribers: Mutex::new(Vec::new()),
                auth_rx,
            }),
        }
    }

    /// The account store this coordinator mutates.
    pub fn store(&self) -> &AccountStore {
        &self.inner.store
    }

    // === Login ===

    /// Attempt to log in with an email and master password.
    ///
    /// Pipeline: pre-login KDF lookup, local hashing, token exchange. The
    /// plaintext password never leaves the crypto collaborator. Network and
    /// hashing failures collapse to `LoginResult::Error { message: None }`;
    /// only a server-side credential rejection carries a message.
    ///
    /// After `Success` returns, any read of the user or auth state reflects
    /// the new account as active. The post-login vault sync is spawned
    /// fire-and-forget; its failure is logged and does not affect the result.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        captcha_token: Option<&str>,
    ) -> Result<LoginResult> {
        let kdf = match self.inner.auth_api.prelogin(email).await {
            Ok(kdf) => kdf,
            Err(err) => {
                debug!("pre-login lookup failed: {err}");
                return Ok(LoginResult::Error { message: None });
            }
        };

        let password_hash = match self.inner.crypto.hash_password(email, password, &kdf).await {
            Ok(hash) => hash,
            Err(err) => {
                debug!("password hashing failed: {err}");
                return Ok(LoginResult::Error { message: None });
            }
        };

        let device_id = self.device_id()?;
        let response = match self
            .inner
            .auth_api
            .request_token(&device_id, email, &password_hash, captcha_token)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                debug!("token exchange failed: {err}");
                return Ok(LoginResult::Error { message: None });
            }
        };

        match response {
            TokenResponse::CaptchaRequired { site_key } => {
                debug!(email, "login requires captcha");
                Ok(LoginResult::CaptchaRequired { site_key })
            }
            TokenResponse::Invalid { message } => Ok(LoginResult::Error {
                message: Some(message),
            }),
            TokenResponse::Success(identity) => self.complete_login(email, kdf, identity).await,
        }
    }

    /// Success branch of login: unlock, persist, trigger sync.
    ///
    /// The sub-steps are not atomic. A persistence failure after the unlock
    /// leaves an unlocked vault with no stored account until the next login;
    /// this window is accepted (see DESIGN.md) because the vault collaborator
    /// has no compensating relock-with-previous-keys primitive.
    async fn complete_login(
        &self,
        email: &str,
        kdf: KdfParams,
        identity: IdentityTokens,
    ) -> Result<LoginResult> {
        let user_id = identity.profile.user_id.clone();

        if let Err(err) = self
            .inner
            .vault
            .unlock(&user_id, &identity.user_key, &identity.private_key)
            .await
        {
            warn!(user_id = %user_id, "vault unlock failed during login: {err}");
            return Ok(LoginResult::Error { message: None });
        }

        let account = Account {
            profile: AccountProfile {
                user_id: user_id.clone(),
                email: identity.profile.email.clone(),
                kdf,
            },
            tokens: identity.tokens.clone().into(),
        };
        let state = match self.inner.store.user_state() {
            Some(state) => state.with_account(account),
            None => UserState::new(account),
        };
        self.inner.store.write(Some(state))?;
        self.inner
            .store
            .store_user_secrets(&user_id, &identity.user_key, &identity.private_key)?;
        self.inner.store.set_remembered_email(Some(email))?;

        let vault = Arc::clone(&self.inner.vault);
        let sync_user = user_id.clone();
        tokio::spawn(async move {
            if let Err(err) = vault.sync(&sync_user).await {
                warn!(user_id = %sync_user, "post-login vault sync failed: {err}");
            }
        });

        info!(user_id = %user_id, "login succeeded");
        Ok(LoginResult::Success)
    }

    // === Registration ===

    /// Register a new account.
    ///
    /// When `check_data_breaches` is set, a positive breach lookup
    /// short-circuits before any key generation. Registration never mutates
    /// local state; call [`login`](Self::login) afterwards.
    pub async fn register(
        &self,
        email: &str,
        master_password: &str,
        hint: Option<&str>,
        captcha_token: Option<&str>,
        check_data_breaches: bool,
    ) -> Result<RegisterResult> {
        if check_data_breaches {
            match self.inner.breach_api.is_password_breached(master_password).await {
                Ok(true) => {
                    info!(email, "registration stopped, password found in breach data");
                    return Ok(RegisterResult::DataBreachFound);
                }
                Ok(false) => {}
                Err(err) => {
                    debug!("breach lookup failed: {err}");
                    return Ok(RegisterResult::Error { message: None });
                }
            }
        }

        let kdf = KdfParams::default_for_registration();
        let keys = match self
            .inner
            .crypto
            .make_register_keys(email, master_password, &kdf)
            .await
        {
            Ok(keys) => keys,
            Err(err) => {
                debug!("registration key generation failed: {err}");
                return Ok(RegisterResult::Error { message: None });
            }
        };

        let request = RegisterRequest {
            email: email.to_string(),
            master_password_hash: keys.master_password_hash,
            master_password_hint: hint.map(str::to_string),
            captcha_token: captcha_token.map(str::to_string),
            public_key: keys.public_key,
            encrypted_private_key: keys.encrypted_private_key,
            kdf,
        };

        match self.inner.accounts_api.register(request).await {
            Ok(RegisterResponse::Success {
                captcha_bypass_token,
            }) => Ok(RegisterResult::Success {
                captcha_bypass_token,
            }),
            Ok(RegisterResponse::CaptchaRequired { site_keys }) => {
                Ok(match site_keys.into_iter().next() {
                    Some(site_key) => RegisterResult::CaptchaRequired { site_key },
                    None => RegisterResult::Error {
                        message: Some(CAPTCHA_FALLBACK_MESSAGE.to_string()),
                    },
                })
            }
            Ok(RegisterResponse::Invalid {
                validation_errors,
                message,
            }) => {
                let first = validation_errors
                    .values()
                    .flat_map(|messages| messages.iter())
                    .next()
                    .cloned();
                Ok(RegisterResult::Error {
                    message: first
                        .or(message)
                        .or_else(|| Some(REGISTRATION_FALLBACK_MESSAGE.to_string())),
                })
            }
            Ok(RegisterResponse::Error { message }) => Ok(RegisterResult::Error { message }),
            Err(err) => {
                debug!("registration call failed: {err}");
                Ok(RegisterResult::Error { message: None })
            }
        }
    }

    // === Logout / teardown ===

    /// Log out a stored account.
    ///
    /// `None` targets the active account and is a no-op when nobody is logged
    /// in; logging out a non-active account leaves the active session alone.
    /// The removed account's vault is locked and its stored keys cleared;
    /// in-memory unlocked data is dropped only when the removed account was
    /// the active one.
    pub async fn logout(&self, user_id: Option<&str>) -> Result<()> {
        let target = match user_id {
            Some(id) => id.to_string(),
            None => match self.inner.store.active_user_id() {
                Some(id) => id,
                None => return Ok(()),
            },
        };

        let Some(removal) = self.inner.store.remove_account(&target)? else {
            return Ok(());
        };

        if let Err(err) = self.inner.vault.lock(&target).await {
            warn!(user_id = %target, "vault lock on logout failed: {err}");
        }
        if removal.was_active {
            if let Err(err) = self.inner.vault.clear_unlocked_data().await {
                warn!("clearing unlocked vault data failed: {err}");
            }
        }
        info!(user_id = %target, was_active = removal.was_active, "logged out");
        Ok(())
    }

    /// Delete the active account on the server, then tear it down locally.
    ///
    /// Fails with [`SessionError::NotLoggedIn`] when no account is active.
    pub async fn delete_account(&self, password: &str) -> Result<()> {
        let account = self
            .inner
            .store
            .active_account()
            .ok_or(SessionError::NotLoggedIn)?;

        let password_hash = self
            .inner
            .crypto
            .hash_password(&account.profile.email, password, &account.profile.kdf)
            .await
            .map_err(|err| SessionError::Crypto {
                reason: err.to_string(),
            })?;

        self.inner
            .accounts_api
            .delete_account(&password_hash)
            .await
            .map_err(|err| SessionError::Network {
                message: err.to_string(),
            })?;

        info!(user_id = %account.profile.user_id, "account deleted on server");
        self.logout(Some(&account.profile.user_id)).await
    }

    /// Make another stored account the active one.
    pub fn switch_account(&self, user_id: &str) -> Result<()> {
        self.inner.store.switch_account(user_id)
    }

    // === Token lifecycle ===

    /// Refresh an account's tokens.
    ///
    /// **Blocking call.** Executes synchronously so a request-retry
    /// interceptor that cannot suspend may call it on a failed authorization.
    /// Never call it on a runtime thread that the refresh transport itself
    /// depends on; inside a runtime, use `spawn_blocking`.
    ///
    /// Safe to call from multiple concurrent failed-request contexts; the
    /// store's whole-value write gives last-successful-write-wins semantics.
    pub fn refresh_access_token(&self, user_id: &str) -> Result<TokenPair> {
        let mut state = self
            .inner
            .store
            .user_state()
            .ok_or(SessionError::NotLoggedIn)?;
        let refresh_token = state
            .accounts
            .get(user_id)
            .map(|account| account.tokens.refresh_token.clone())
            .ok_or(SessionError::NotLoggedIn)?;

        let pair = self
            .inner
            .auth_api
            .refresh_token(&refresh_token)
            .map_err(|err| SessionError::Network {
                message: err.to_string(),
            })?;

        if let Some(account) = state.accounts.get_mut(user_id) {
            account.tokens = pair.clone().into();
        }
        self.inner.store.write(Some(state))?;
        debug!(user_id, "access token refreshed");
        Ok(pair)
    }

    // === Local helpers ===

    /// Classify a password's strength locally.
    ///
    /// The email is accepted for signature compatibility with the future
    /// scoring collaborator; the current classifier ignores it.
    pub fn password_strength(&self, _email: &str, password: &str) -> PasswordStrength {
        PasswordStrength::classify(password)
    }

    /// Stable identifier for this device, generated on first use.
    fn device_id(&self) -> Result<String> {
        if let Some(id) = self.inner.persist.device_id()? {
            return Ok(id);
        }
        let id = Uuid::new_v4().to_string();
        self.inner.persist.set_device_id(&id)?;
        Ok(id)
    }

    // === Streams ===

    /// Current derived authentication state.
    ///
    /// Derived directly from the latest written user state, so a read
    /// immediately after `login`, `switch_account`, or `logout` returns
    /// already reflects the mutation. The stream from
    /// [`subscribe_auth_state`](Self::subscribe_auth_state) catches up
    /// asynchronously.
    pub fn auth_state(&self) -> AuthState {
        AuthState::derive(self.inner.store.user_state().as_ref())
    }

    /// Subscribe to auth-state changes; the latest value is replayed.
    pub fn subscribe_auth_state(&self) -> watch::Receiver<AuthState> {
        self.inner.auth_rx.clone()
    }

    /// Subscribe to CAPTCHA completion events.
    ///
    /// Transient multicast: events are buffered without bound per subscriber,
    /// and new subscribers do not see past events.
    pub fn captcha_token_stream(&self) -> mpsc::UnboundedReceiver<CaptchaTokenResult> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.captcha_subscribers.lock().unwrap().push(tx);
        rx
    }

    /// Deliver a CAPTCHA completion to every live subscriber.
    ///
    /// Called when the out-of-process challenge finishes, to resume the login
    /// attempt waiting on it.
    pub fn emit_captcha_token(&self, result: CaptchaTokenResult) {
        let mut subscribers = self.inner.captcha_subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(result.clone()).is_ok());
        debug!(subscribers = subscribers.len(), "captcha token result broadcast");
    }
}

impl From<TokenPair> for AccountTokens {
    fn from(pair: TokenPair) -> Self {
        AccountTokens {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}
