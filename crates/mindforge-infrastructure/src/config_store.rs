//! Remote endpoint configuration loading.
//!
//! Configuration priority: environment variables > config.toml > built-in
//! defaults. The file is created with defaults on first access so users have
//! something to edit.

use crate::paths::MindforgePaths;
use mindforge_core::config::RemoteConfig;
use std::env;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Loads and caches the remote endpoint configuration.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    /// Cached configuration loaded from file.
    /// Uses RwLock for thread-safe lazy loading.
    config: Arc<RwLock<Option<RemoteConfig>>>,
    path: Option<PathBuf>,
}

impl ConfigStore {
    /// Creates a new ConfigStore using the default config path.
    ///
    /// The configuration is loaded lazily on first access to avoid blocking
    /// during initialization.
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            path: None,
        }
    }

    /// Creates a ConfigStore reading from a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            path: Some(path),
        }
    }

    /// Gets the remote configuration, loading from file if not cached.
    pub fn get(&self) -> RemoteConfig {
        {
            let read_lock = self.config.read().unwrap();
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = Self::apply_env_overrides(self.load_from_file());

        {
            let mut write_lock = self.config.write().unwrap();
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap();
        *write_lock = None;
    }

    fn config_path(&self) -> Option<PathBuf> {
        match &self.path {
            Some(path) => Some(path.clone()),
            None => MindforgePaths::config_file().ok(),
        }
    }

    /// Loads config.toml, creating it with defaults when missing. Any
    /// failure falls back to the built-in defaults.
    fn load_from_file(&self) -> RemoteConfig {
        let Some(path) = self.config_path() else {
            return RemoteConfig::default();
        };

        if !path.exists() {
            let default_config = RemoteConfig::default();
            if let Err(e) = Self::write_default(&path, &default_config) {
                warn!(path = %path.display(), error = %e, "Failed to write default config");
            }
            return default_config;
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Malformed config.toml, using defaults");
                    RemoteConfig::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config.toml, using defaults");
                RemoteConfig::default()
            }
        }
    }

    fn write_default(path: &PathBuf, config: &RemoteConfig) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Environment variables override whatever the file says.
    fn apply_env_overrides(mut config: RemoteConfig) -> RemoteConfig {
        if let Ok(url) = env::var("MINDFORGE_API_URL") {
            if !url.is_empty() {
                config.generation_url = url;
            }
        }
        if let Ok(url) = env::var("MINDFORGE_BACKEND_URL") {
            if !url.is_empty() {
                config.backend_url = url;
            }
        }
        if let Ok(key) = env::var("MINDFORGE_BACKEND_KEY") {
            if !key.is_empty() {
                config.backend_publishable_key = key;
            }
        }
        config
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}
