//!
//! TTL-gated cache of server capability/configuration data.
//!
//! [`ConfigCache`] is the single owner of the cached [`ServerConfig`]. The
//! value is replaced wholesale on every refresh and published to a
//! replay-latest stream; it is never partially mutated. Staleness is decided
//! against an injected [`Clock`], which keeps the TTL math deterministic in
//! tests.
//!
//! Concurrent forced and environment-triggered refreshes are not deduplicated:
//! both may fetch, and the last successful write wins on the persisted value
//! and the stream. Observers only ever see fully-formed configs.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::{
    Result,
    api::ConfigApi,
    clock::Clock,
    persist::SettingsStore,
};

pub mod errors;
pub mod types;

pub use errors::ConfigError;
pub use types::{EnvironmentUrls, ServerConfig, ServerData};

/// Cached config is considered stale once it is this old.
pub const CONFIG_TTL_MILLIS: u64 = 60 * 60 * 1000;

/// Internal state for ConfigCache
struct ConfigInternal {
    persist: Arc<dyn SettingsStore>,
    api: Arc<dyn ConfigApi>,
    clock: Arc<dyn Clock>,
    /// Latest config; the sender side of the replay-latest stream
    current: watch::Sender<Option<ServerConfig>>,
}

/// TTL-gated server configuration cache.
///
/// Cheap-to-clone handle around `Arc<ConfigInternal>`.
#[derive(Clone)]
pub struct ConfigCache {
    inner: Arc<ConfigInternal>,
}

impl std::fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCache")
            .field("current", &*self.inner.current.borrow())
            .finish()
    }
}

impl ConfigCache {
    /// Load the cache, seeding in-memory state from the persisted value.
    pub fn load(
        persist: Arc<dyn SettingsStore>,
        api: Arc<dyn ConfigApi>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let seeded = persist.server_config()?;
        let (current, _) = watch::channel(seeded);
        Ok(Self {
            inner: Arc::new(ConfigInternal {
                persist,
                api,
                clock,
                current,
            }),
        })
    }

    /// Get the server configuration, fetching when stale or forced.
    ///
    /// The cache is stale when empty or when the last fetch is at least
    /// [`CONFIG_TTL_MILLIS`] old. A fresh cached value is returned unchanged,
    /// so callers (and tests) can observe that no refresh happened.
    pub async fn get_server_config(&self, force_refresh: bool) -> Result<ServerConfig> {
        let cached = self.inner.current.borrow().clone();
        let now = self.inner.clock.now_millis();
        let is_stale = cached
            .as_ref()
            .map_or(true, |c| now.saturating_sub(c.last_sync_epoch_millis) >= CONFIG_TTL_MILLIS);

        if force_refresh || is_stale {
            debug!(force_refresh, is_stale, "refreshing server config");
            return self.refresh().await;
        }

        // `is_stale` is false, so the cache cannot be empty here.
        cached.ok_or_else(|| {
            ConfigError::Fetch {
                message: "cache empty".to_string(),
            }
            .into()
        })
    }

    /// React to an active-environment switch.
    ///
    /// Treated as an implicit forced refresh: the stream emits a freshly
    /// fetched config even when the TTL has not elapsed.
    pub async fn on_environment_changed(&self) -> Result<ServerConfig> {
        info!("environment changed, forcing server config refresh");
        self.refresh().await
    }

    /// Subscribe to config changes; the latest value is replayed immediately.
    pub fn subscribe(&self) -> watch::Receiver<Option<ServerConfig>> {
        self.inner.current.subscribe()
    }

    /// The latest cached config without any staleness check or fetch.
    pub fn cached(&self) -> Option<ServerConfig> {
        self.inner.current.borrow().clone()
    }

    async fn refresh(&self) -> Result<ServerConfig> {
        let server_data = self
            .inner
            .api
            .fetch_config()
            .await
            .map_err(|err| ConfigError::Fetch {
                message: err.to_string(),
            })?;
        let config = ServerConfig {
            server_data,
            last_sync_epoch_millis: self.inner.clock.now_millis(),
        };
        self.inner.persist.set_server_config(Some(&config))?;
        self.inner.current.send_replace(Some(config.clone()));
        debug!(
            version = %config.server_data.version,
            last_sync = %self.inner.clock.now_rfc3339(),
            "server config refreshed"
        );
        Ok(config)
    }
}
