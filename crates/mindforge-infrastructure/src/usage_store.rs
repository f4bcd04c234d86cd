//! Durable storage for anonymous usage counters.
//!
//! The counter file is advisory data: a missing or corrupt file is treated
//! as zero counts, never as an error the caller has to handle.

use crate::paths::MindforgePaths;
use mindforge_core::error::{MindforgeError, Result};
use mindforge_core::usage::UsageCounters;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Storage for the usage counter file (usage.json).
///
/// Responsibilities:
/// - Load usage.json from the config directory
/// - Fail open to zeroed counters on missing or malformed data
/// - Persist updated counters
pub struct UsageStore {
    path: PathBuf,
}

impl UsageStore {
    /// Creates a store with the default path (config dir / usage.json).
    pub fn new() -> Result<Self> {
        let path = MindforgePaths::usage_file()
            .map_err(|e| MindforgeError::config(format!("Failed to get usage path: {}", e)))?;
        Ok(Self { path })
    }

    /// Creates a store with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the counters, failing open to zeros.
    ///
    /// A missing file, unreadable file, or parse failure all read as zero
    /// counts; the failure is logged and never propagated.
    pub fn load(&self) -> UsageCounters {
        if !self.path.exists() {
            return UsageCounters::default();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read usage file, treating as empty");
                return UsageCounters::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(counters) => counters,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Malformed usage file, treating as empty");
                UsageCounters::default()
            }
        }
    }

    /// Persists the counters.
    pub fn save(&self, counters: &UsageCounters) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(counters)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Returns the path to the usage file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}
