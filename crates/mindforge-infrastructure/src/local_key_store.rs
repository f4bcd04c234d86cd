//! Local-only API key storage for anonymous profiles.
//!
//! Keys for a signed-in user live in account storage; before sign-in they go
//! into a plaintext provider -> key map in the config directory. Parse
//! failures read as an empty map so a damaged file never blocks the user.

use crate::paths::MindforgePaths;
use mindforge_core::error::{MindforgeError, Result};
use mindforge_core::provider::Provider;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Storage for the anonymous API key map (api_keys.json).
///
/// # Security Note
///
/// This storage writes plaintext JSON. The file is created with 600
/// permissions on Unix; there is no encryption at rest.
pub struct LocalKeyStore {
    path: PathBuf,
}

impl LocalKeyStore {
    /// Creates a store with the default path (config dir / api_keys.json).
    pub fn new() -> Result<Self> {
        let path = MindforgePaths::local_keys_file()
            .map_err(|e| MindforgeError::config(format!("Failed to get key path: {}", e)))?;
        Ok(Self { path })
    }

    /// Creates a store with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the provider -> key map, failing open to empty.
    pub fn load(&self) -> HashMap<Provider, String> {
        if !self.path.exists() {
            return HashMap::new();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read local key file, treating as empty");
                return HashMap::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Malformed local key file, treating as empty");
                HashMap::new()
            }
        }
    }

    /// Returns the stored key for a provider, if any.
    pub fn get(&self, provider: Provider) -> Option<String> {
        self.load().remove(&provider)
    }

    /// Stores a key for a provider (read-modify-write).
    pub fn set(&self, provider: Provider, api_key: &str) -> Result<()> {
        let mut map = self.load();
        map.insert(provider, api_key.to_string());
        self.save(&map)
    }

    fn save(&self, map: &HashMap<Provider, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.path, permissions)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalKeyStore::with_path(temp_dir.path().join("api_keys.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_set_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalKeyStore::with_path(temp_dir.path().join("api_keys.json"));

        store.set(Provider::OpenAi, "sk-test-key").unwrap();
        store.set(Provider::Google, "AIza-test").unwrap();

        assert_eq!(store.get(Provider::OpenAi).as_deref(), Some("sk-test-key"));
        assert_eq!(store.get(Provider::Google).as_deref(), Some("AIza-test"));
        assert!(store.get(Provider::Cohere).is_none());
    }

    #[test]
    fn test_set_overwrites_existing_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalKeyStore::with_path(temp_dir.path().join("api_keys.json"));

        store.set(Provider::OpenAi, "sk-old").unwrap();
        store.set(Provider::OpenAi, "sk-new").unwrap();

        assert_eq!(store.get(Provider::OpenAi).as_deref(), Some("sk-new"));
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_malformed_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("api_keys.json");
        fs::write(&path, "[1, 2").unwrap();
        let store = LocalKeyStore::with_path(path);
        assert!(store.load().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_permissions_are_user_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = LocalKeyStore::with_path(temp_dir.path().join("api_keys.json"));
        store.set(Provider::Cohere, &"k".repeat(24)).unwrap();

        let mode = fs::metadata(store.path.clone()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
