//! Remote endpoint configuration.

use serde::{Deserialize, Serialize};

/// Default generation endpoint base URL.
pub const DEFAULT_GENERATION_URL: &str = "https://mindforge-api.onrender.com";
/// Default account backend base URL.
pub const DEFAULT_BACKEND_URL: &str = "https://account.mindforge.app";

/// Where the client sends its network traffic.
///
/// Loaded from `config.toml` in the config directory; every field can also be
/// overridden through environment variables (`MINDFORGE_API_URL`,
/// `MINDFORGE_BACKEND_URL`, `MINDFORGE_BACKEND_KEY`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the generation endpoint.
    #[serde(default = "default_generation_url")]
    pub generation_url: String,
    /// Base URL of the hosted account backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Publishable (anonymous) key sent with every backend request.
    #[serde(default)]
    pub backend_publishable_key: String,
}

fn default_generation_url() -> String {
    DEFAULT_GENERATION_URL.to_string()
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            generation_url: default_generation_url(),
            backend_url: default_backend_url(),
            backend_publishable_key: String::new(),
        }
    }
}
