//! Durable local session identifier.
//!
//! Anonymous usage logs are attributed to a session id that is generated once
//! per profile and then reused for the life of the installation.

use crate::paths::MindforgePaths;
use mindforge_core::error::{MindforgeError, Result};
use std::fs;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

/// Storage for the session identifier file.
pub struct SessionIdStore {
    path: PathBuf,
}

impl SessionIdStore {
    /// Creates a store with the default path (config dir / session_id).
    pub fn new() -> Result<Self> {
        let path = MindforgePaths::session_file()
            .map_err(|e| MindforgeError::config(format!("Failed to get session path: {}", e)))?;
        Ok(Self { path })
    }

    /// Creates a store with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the durable session id, creating one on first run.
    ///
    /// An unreadable or empty file is replaced with a fresh id rather than
    /// surfaced as an error.
    pub fn load_or_create(&self) -> Result<String> {
        if let Ok(content) = fs::read_to_string(&self.path) {
            let existing = content.trim();
            if !existing.is_empty() {
                return Ok(existing.to_string());
            }
        }

        let session_id = Uuid::new_v4().to_string();
        debug!(session_id = %session_id, "Created new session identifier");

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, &session_id)?;
        Ok(session_id)
    }
}
