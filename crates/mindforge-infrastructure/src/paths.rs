//! Unified path management for mindforge durable files.
//!
//! All durable client state (usage counters, the session identifier, the
//! anonymous API key map, configuration) lives under one config directory,
//! resolved per platform.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/mindforge/         # Config directory (XDG on Linux/macOS)
//! ├── config.toml              # Remote endpoint configuration
//! ├── usage.json               # Anonymous generation counters
//! ├── session_id               # Durable local session identifier
//! ├── api_keys.json            # Anonymous provider -> API key map
//! ├── auth_token               # Backend session token (when signed in)
//! └── logs/                    # Application logs
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for mindforge.
pub struct MindforgePaths;

impl MindforgePaths {
    /// Returns the mindforge configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/mindforge/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("mindforge"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the anonymous usage counter file.
    pub fn usage_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("usage.json"))
    }

    /// Returns the path to the durable session identifier file.
    pub fn session_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("session_id"))
    }

    /// Returns the path to the anonymous API key map.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn local_keys_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("api_keys.json"))
    }

    /// Returns the path to the persisted backend session token.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn token_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("auth_token"))
    }

    /// Returns the path to the logs directory.
    pub fn logs_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("logs"))
    }

    /// Ensures the anonymous key file exists, creating an empty map if absent.
    ///
    /// # Security Note
    ///
    /// This function sets file permissions to 600 (user read/write only) on
    /// Unix systems.
    pub fn ensure_local_keys_file() -> Result<PathBuf, std::io::Error> {
        let keys_path = Self::local_keys_file()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()))?;

        if keys_path.exists() {
            return Ok(keys_path);
        }

        if let Some(parent) = keys_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&keys_path, "{}")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&keys_path, permissions)?;
        }

        Ok(keys_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir() {
        let config_dir = MindforgePaths::config_dir().unwrap();
        assert!(config_dir.ends_with("mindforge"));
    }

    #[test]
    fn test_config_file() {
        let config_file = MindforgePaths::config_file().unwrap();
        assert!(config_file.ends_with("config.toml"));
        let config_dir = MindforgePaths::config_dir().unwrap();
        assert!(config_file.starts_with(&config_dir));
    }

    #[test]
    fn test_usage_file() {
        let usage_file = MindforgePaths::usage_file().unwrap();
        assert!(usage_file.ends_with("usage.json"));
    }

    #[test]
    fn test_session_file() {
        let session_file = MindforgePaths::session_file().unwrap();
        assert!(session_file.ends_with("session_id"));
    }

    #[test]
    fn test_local_keys_file() {
        let keys_file = MindforgePaths::local_keys_file().unwrap();
        assert!(keys_file.ends_with("api_keys.json"));
    }

    #[test]
    fn test_logs_dir() {
        let logs_dir = MindforgePaths::logs_dir().unwrap();
        assert!(logs_dir.ends_with("logs"));
        let config_dir = MindforgePaths::config_dir().unwrap();
        assert!(logs_dir.starts_with(&config_dir));
    }
}
