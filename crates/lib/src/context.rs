//!
//! Explicit session context.
//!
//! [`SessionContext`] replaces process-global access to the store and cache
//! with one explicitly constructed object: it is the single initialization
//! point that seeds state from persistence, wires every collaborator, and
//! starts the reactive publishers. Dependents receive clones of the handle;
//! there is no implicit re-initialization.

use std::sync::Arc;

use crate::{
    Result,
    api::{AccountsApi, AuthApi, BreachApi, ConfigApi},
    clock::{Clock, SystemClock},
    config::ConfigCache,
    crypto::CredentialCrypto,
    persist::SettingsStore,
    session::SessionCoordinator,
    store::AccountStore,
    vault::VaultHandle,
};

/// The external collaborators a session context is wired with.
pub struct Collaborators {
    pub persist: Arc<dyn SettingsStore>,
    pub auth_api: Arc<dyn AuthApi>,
    pub accounts_api: Arc<dyn AccountsApi>,
    pub breach_api: Arc<dyn BreachApi>,
    pub config_api: Arc<dyn ConfigApi>,
    pub crypto: Arc<dyn CredentialCrypto>,
    pub vault: Arc<dyn VaultHandle>,
}

/// Internal state for SessionContext
struct ContextInternal {
    store: AccountStore,
    config: ConfigCache,
    session: SessionCoordinator,
}

/// The session core of the application: account store, config cache, and
/// session coordinator behind one cheap-to-clone handle.
///
/// The reactive publishers started here live for the life of the process;
/// construct the context once, inside a tokio runtime, at startup.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<ContextInternal>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("store", &self.inner.store)
            .field("config", &self.inner.config)
            .finish()
    }
}

impl SessionContext {
    /// Construct the context, seeding state from persistence.
    pub fn new(collaborators: Collaborators) -> Result<Self> {
        Self::build(collaborators, Arc::new(SystemClock))
    }

    /// Construct the context with a custom clock.
    ///
    /// This is the same as [`SessionContext::new`] but allows injecting a
    /// controllable clock (typically [`FixedClock`](crate::FixedClock)) so
    /// tests can drive TTL and staleness behavior deterministically.
    ///
    /// Only available with the `testing` feature or in test builds.
    #[cfg(any(test, feature = "testing"))]
    pub fn with_clock(collaborators: Collaborators, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::build(collaborators, clock)
    }

    fn build(collaborators: Collaborators, clock: Arc<dyn Clock>) -> Result<Self> {
        let Collaborators {
            persist,
            auth_api,
            accounts_api,
            breach_api,
            config_api,
            crypto,
            vault,
        } = collaborators;

        let store = AccountStore::load(persist.clone())?;
        let config = ConfigCache::load(persist.clone(), config_api, clock)?;
        let session = SessionCoordinator::new(
            store.clone(),
            persist,
            auth_api,
            accounts_api,
            breach_api,
            crypto,
            vault,
        );

        Ok(Self {
            inner: Arc::new(ContextInternal {
                store,
                config,
                session,
            }),
        })
    }

    /// The multi-account state store.
    pub fn store(&self) -> &AccountStore {
        &self.inner.store
    }

    /// The server configuration cache.
    pub fn config(&self) -> &ConfigCache {
        &self.inner.config
    }

    /// The session coordinator.
    pub fn session(&self) -> &SessionCoordinator {
        &self.inner.session
    }

    /// Signal that the active network environment changed.
    ///
    /// Forces a config refresh; the config stream emits the fresh value even
    /// when the TTL has not elapsed.
    pub async fn environment_changed(&self) -> Result<()> {
        self.inner.config.on_environment_changed().await?;
        Ok(())
    }
}
