//! Server configuration payload types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-service base URLs advertised by the server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentUrls {
    pub api: Option<String>,
    pub identity: Option<String>,
    pub icons: Option<String>,
    pub notifications: Option<String>,
}

/// Opaque capability payload returned by the config endpoint.
///
/// Consumers treat this as advisory data: feature flags gate behavior,
/// service URLs route requests. Latchkey never interprets the flag values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerData {
    /// Server software version
    pub version: String,

    /// Display name of the server, if advertised
    pub server_name: Option<String>,

    /// Canonical server URL, if advertised
    pub server_url: Option<String>,

    /// Per-service URLs for the current environment
    pub environment: EnvironmentUrls,

    /// Feature flags, keyed by flag name
    pub feature_flags: BTreeMap<String, serde_json::Value>,
}

/// A fetched server configuration together with when it was fetched.
///
/// Replaced wholesale on refresh, never partially mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub server_data: ServerData,

    /// Milliseconds since Unix epoch at which `server_data` was fetched
    pub last_sync_epoch_millis: u64,
}
