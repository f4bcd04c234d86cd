//! Credential records and the account backend service traits.
//!
//! The hosted backend (authentication + row storage) is an external
//! collaborator. These traits define the only surface the rest of the
//! application depends on, so the HTTP implementation can be swapped for an
//! in-memory one in tests.

use crate::error::Result;
use crate::generation::UsageLogEntry;
use crate::provider::Provider;
use crate::usage::UsageCounters;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored API key for one generation provider.
///
/// At most one record exists per (user, provider) pair; writes are upserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub provider: Provider,
    pub api_key: String,
    pub last_used: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            last_used: Utc::now(),
        }
    }
}

/// An authenticated backend session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: String,
    pub email: String,
}

/// Authentication operations delegated to the hosted backend.
///
/// # Security Note
///
/// Implementations must not include passwords or tokens in error messages.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a new account and returns its session.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Authenticates with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Restores a pre-existing backend session, if one is still valid.
    async fn restore_session(&self) -> Result<Option<AuthSession>>;

    /// Requests a password reset email. Best-effort.
    async fn request_password_reset(&self, email: &str) -> Result<()>;
}

/// Account-scoped row storage delegated to the hosted backend.
///
/// The application depends on four capabilities: an upsert-or-fallback write
/// path for credential records keyed by (user, provider), a read returning
/// all credential records for a user, counter increments for usage totals,
/// and an append-only log write for audit.
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// Returns all credential records stored for the user.
    async fn fetch_credentials(&self, user_id: &str) -> Result<Vec<CredentialRecord>>;

    /// Creates or overwrites the credential for (user, provider).
    ///
    /// Implementations resolve the account email themselves where the row
    /// schema wants it.
    async fn upsert_credential(
        &self,
        user_id: &str,
        provider: Provider,
        api_key: &str,
    ) -> Result<()>;

    /// Adds transferred anonymous counts to the account's durable totals.
    async fn add_usage(&self, user_id: &str, counters: &UsageCounters) -> Result<()>;

    /// Increments the account's total generation counter by one.
    async fn increment_total_generations(&self, user_id: &str) -> Result<()>;

    /// Appends one audit record to the usage log.
    async fn append_usage_log(&self, entry: &UsageLogEntry) -> Result<()>;

    /// Updates the last-login marker and appends a login-history record.
    async fn touch_last_login(&self, user_id: &str) -> Result<()>;

    /// Whether a profile row exists for the user.
    async fn profile_exists(&self, user_id: &str) -> Result<bool>;

    /// Creates a profile row with zeroed counters.
    async fn create_profile(&self, user_id: &str) -> Result<()>;
}
