//! Persisted backend session token.
//!
//! Lets a later run restore the signed-in session instead of asking the user
//! to authenticate again. Cleared on sign-out.

use crate::paths::MindforgePaths;
use mindforge_core::error::{MindforgeError, Result};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Storage for the backend session token (auth_token).
///
/// # Security Note
///
/// The token is stored in plaintext with 600 permissions on Unix.
pub struct AuthTokenStore {
    path: PathBuf,
}

impl AuthTokenStore {
    /// Creates a store with the default path (config dir / auth_token).
    pub fn new() -> Result<Self> {
        let path = MindforgePaths::token_file()
            .map_err(|e| MindforgeError::config(format!("Failed to get token path: {}", e)))?;
        Ok(Self { path })
    }

    /// Creates a store with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the persisted token, if any. Read failures read as "no
    /// session".
    pub fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(_) => None,
        }
    }

    /// Persists the token.
    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.path, permissions)?;
        }

        Ok(())
    }

    /// Deletes the persisted token. Missing file is fine.
    pub fn clear(&self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "Failed to clear session token");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = AuthTokenStore::with_path(temp_dir.path().join("auth_token"));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_load_clear_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = AuthTokenStore::with_path(temp_dir.path().join("auth_token"));

        store.save("token-abc").unwrap();
        assert_eq!(store.load().as_deref(), Some("token-abc"));

        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_blank_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("auth_token");
        fs::write(&path, "\n  \n").unwrap();
        let store = AuthTokenStore::with_path(path);
        assert!(store.load().is_none());
    }
}
