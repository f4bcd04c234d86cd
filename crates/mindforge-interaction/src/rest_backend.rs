//! REST client for the hosted account backend.
//!
//! Implements authentication and account-scoped row storage against a
//! PostgREST-flavored API. Every request carries the publishable key; row
//! operations additionally carry the user's bearer token once signed in.
//!
//! The credential write path is an ordered chain of strategies tried in
//! sequence until one succeeds, because not every deployment exposes a
//! native upsert.

use async_trait::async_trait;
use chrono::Utc;
use mindforge_core::credential::{AccountStore, AuthService, AuthSession, CredentialRecord};
use mindforge_core::error::{MindforgeError, Result};
use mindforge_core::generation::UsageLogEntry;
use mindforge_core::provider::Provider;
use mindforge_core::usage::UsageCounters;
use mindforge_infrastructure::ConfigStore;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// One way of writing a credential row to the backend.
///
/// Ordered from the preferred native path down to the most compatible
/// fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStrategy {
    /// Single insert with merge-on-conflict preference.
    Upsert,
    /// Server-side RPC that owns the conflict handling.
    InsertViaRpc,
    /// Plain insert, then an update when the insert hits the unique key.
    InsertThenUpdate,
}

/// The credential write strategies, in the order they are attempted.
pub const WRITE_STRATEGIES: [WriteStrategy; 3] = [
    WriteStrategy::Upsert,
    WriteStrategy::InsertViaRpc,
    WriteStrategy::InsertThenUpdate,
];

/// HTTP implementation of [`AuthService`] and [`AccountStore`].
#[derive(Clone)]
pub struct RestAccountBackend {
    client: Client,
    base_url: String,
    publishable_key: String,
    /// Bearer token for the current backend session, if any.
    access_token: Arc<RwLock<Option<String>>>,
}

impl RestAccountBackend {
    /// Creates a backend client for the given base URL and publishable key.
    pub fn new(base_url: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            publishable_key: publishable_key.into(),
            access_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a backend client from config.toml / environment configuration.
    pub fn from_config(config: &ConfigStore) -> Self {
        let remote = config.get();
        Self::new(remote.backend_url, remote.backend_publishable_key)
    }

    /// Seeds a persisted access token (session restore across runs).
    pub fn with_access_token(self, token: Option<String>) -> Self {
        *self.access_token.write().unwrap() = token;
        self
    }

    /// The current bearer token, for persistence by the caller.
    pub fn access_token(&self) -> Option<String> {
        self.access_token.read().unwrap().clone()
    }

    /// Drops the current bearer token.
    pub fn clear_access_token(&self) {
        *self.access_token.write().unwrap() = None;
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    fn bearer(&self) -> String {
        self.access_token
            .read()
            .unwrap()
            .clone()
            .unwrap_or_else(|| self.publishable_key.clone())
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.publishable_key)
            .bearer_auth(self.bearer())
    }

    /// Best-effort lookup of the signed-in account's email. Rows that want
    /// an email column get an empty string when the lookup fails.
    async fn current_email(&self) -> String {
        let response = self
            .request(reqwest::Method::GET, self.auth_url("user"))
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => response
                .json::<AuthUser>()
                .await
                .ok()
                .and_then(|user| user.email)
                .unwrap_or_default(),
            _ => {
                warn!("Failed to resolve account email");
                String::new()
            }
        }
    }

    async fn check(response: Response, context: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unreadable error body".to_string());
        Err(MindforgeError::backend(format!(
            "{context} failed ({status}): {body}"
        )))
    }

    async fn send(
        builder: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| MindforgeError::backend(format!("{context}: {e}")))?;
        Self::check(response, context).await
    }

    async fn authenticate(&self, url: String, email: &str, password: &str) -> Result<AuthSession> {
        let response = Self::send(
            self.request(reqwest::Method::POST, url)
                .json(&json!({ "email": email, "password": password })),
            "Authentication",
        )
        .await?;

        let parsed: AuthResponse = response
            .json()
            .await
            .map_err(|e| MindforgeError::backend(format!("Malformed auth response: {e}")))?;

        let user = parsed
            .user
            .ok_or_else(|| MindforgeError::backend("Auth response carried no user"))?;

        *self.access_token.write().unwrap() = parsed.access_token;

        Ok(AuthSession {
            user_id: user.id,
            email: user.email.unwrap_or_else(|| email.to_string()),
        })
    }

    /// Attempts one credential write strategy.
    async fn try_write(
        &self,
        strategy: WriteStrategy,
        user_id: &str,
        email: &str,
        provider: Provider,
        api_key: &str,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        match strategy {
            WriteStrategy::Upsert => {
                Self::send(
                    self.request(reqwest::Method::POST, self.rest_url("api_keys"))
                        .header("Prefer", "resolution=merge-duplicates,return=minimal")
                        .json(&json!({
                            "user_id": user_id,
                            "email": email,
                            "provider": provider.to_string(),
                            "api_key": api_key,
                            "created_at": now,
                            "last_used": now,
                        })),
                    "Credential upsert",
                )
                .await?;
                Ok(())
            }
            WriteStrategy::InsertViaRpc => {
                Self::send(
                    self.request(reqwest::Method::POST, self.rest_url("rpc/insert_api_key"))
                        .json(&json!({
                            "p_user_id": user_id,
                            "p_email": email,
                            "p_provider": provider.to_string(),
                            "p_api_key": api_key,
                        })),
                    "Credential insert rpc",
                )
                .await?;
                Ok(())
            }
            WriteStrategy::InsertThenUpdate => {
                let insert = Self::send(
                    self.request(reqwest::Method::POST, self.rest_url("api_keys"))
                        .header("Prefer", "return=minimal")
                        .json(&json!({
                            "user_id": user_id,
                            "email": email,
                            "provider": provider.to_string(),
                            "api_key": api_key,
                            "created_at": now,
                        })),
                    "Credential insert",
                )
                .await;

                match insert {
                    Ok(_) => Ok(()),
                    Err(insert_err) => {
                        // Likely a conflict with an existing row; update it.
                        debug!(error = %insert_err, "Insert failed, trying update instead");
                        let url = format!(
                            "{}?user_id=eq.{}&provider=eq.{}",
                            self.rest_url("api_keys"),
                            user_id,
                            provider
                        );
                        Self::send(
                            self.request(reqwest::Method::PATCH, url)
                                .json(&json!({ "api_key": api_key, "last_used": now })),
                            "Credential update",
                        )
                        .await?;
                        Ok(())
                    }
                }
            }
        }
    }
}

#[async_trait]
impl AuthService for RestAccountBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.authenticate(self.auth_url("signup"), email, password)
            .await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.authenticate(self.auth_url("token?grant_type=password"), email, password)
            .await
    }

    async fn restore_session(&self) -> Result<Option<AuthSession>> {
        if self.access_token.read().unwrap().is_none() {
            return Ok(None);
        }

        let response = self
            .request(reqwest::Method::GET, self.auth_url("user"))
            .send()
            .await
            .map_err(|e| MindforgeError::backend(format!("Session restore: {e}")))?;

        if !response.status().is_success() {
            // Expired or revoked token: back to anonymous, not an error.
            debug!(status = %response.status(), "Stored session is no longer valid");
            self.clear_access_token();
            return Ok(None);
        }

        let user: AuthUser = response
            .json()
            .await
            .map_err(|e| MindforgeError::backend(format!("Malformed user response: {e}")))?;

        Ok(Some(AuthSession {
            email: user.email.clone().unwrap_or_default(),
            user_id: user.id,
        }))
    }

    async fn request_password_reset(&self, email: &str) -> Result<()> {
        Self::send(
            self.request(reqwest::Method::POST, self.auth_url("recover"))
                .json(&json!({ "email": email })),
            "Password reset",
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for RestAccountBackend {
    async fn fetch_credentials(&self, user_id: &str) -> Result<Vec<CredentialRecord>> {
        let url = format!(
            "{}?user_id=eq.{}&select=provider,api_key,last_used",
            self.rest_url("api_keys"),
            user_id
        );
        let response =
            Self::send(self.request(reqwest::Method::GET, url), "Credential fetch").await?;

        let rows: Vec<ApiKeyRow> = response
            .json()
            .await
            .map_err(|e| MindforgeError::backend(format!("Malformed credential rows: {e}")))?;

        let records = rows
            .into_iter()
            .filter_map(|row| match Provider::from_str(&row.provider) {
                Ok(provider) => Some(CredentialRecord {
                    provider,
                    api_key: row.api_key,
                    last_used: row.last_used.unwrap_or_else(Utc::now),
                }),
                Err(_) => {
                    warn!(provider = %row.provider, "Skipping credential row with unknown provider");
                    None
                }
            })
            .collect();

        Ok(records)
    }

    async fn upsert_credential(&self, user_id: &str, provider: Provider, api_key: &str) -> Result<()> {
        let email = self.current_email().await;
        for strategy in WRITE_STRATEGIES {
            match self
                .try_write(strategy, user_id, &email, provider, api_key)
                .await
            {
                Ok(()) => {
                    debug!(?strategy, %provider, "Credential write succeeded");
                    return Ok(());
                }
                Err(e) => {
                    warn!(?strategy, %provider, error = %e, "Credential write strategy failed");
                }
            }
        }

        Err(MindforgeError::backend(
            "All credential write strategies failed",
        ))
    }

    async fn add_usage(&self, user_id: &str, counters: &UsageCounters) -> Result<()> {
        Self::send(
            self.request(reqwest::Method::POST, self.rest_url("rpc/add_usage_counts"))
                .json(&json!({
                    "p_user_id": user_id,
                    "p_research": counters.research_count,
                    "p_normal": counters.normal_count,
                    "p_total": counters.total(),
                })),
            "Usage transfer",
        )
        .await?;
        Ok(())
    }

    async fn increment_total_generations(&self, user_id: &str) -> Result<()> {
        Self::send(
            self.request(
                reqwest::Method::POST,
                self.rest_url("rpc/increment_generations"),
            )
            .json(&json!({ "p_user_id": user_id })),
            "Generation counter increment",
        )
        .await?;
        Ok(())
    }

    async fn append_usage_log(&self, entry: &UsageLogEntry) -> Result<()> {
        Self::send(
            self.request(reqwest::Method::POST, self.rest_url("usage_logs"))
                .header("Prefer", "return=minimal")
                .json(&json!({
                    "user_id": entry.user_id,
                    "session_id": entry.session_id,
                    "generation_type": entry.generation_kind.as_str(),
                    "prompt_text": entry.prompt_text,
                    "model_used": entry.model_used,
                    "created_at": entry.created_at.to_rfc3339(),
                })),
            "Usage log insert",
        )
        .await?;
        Ok(())
    }

    async fn touch_last_login(&self, user_id: &str) -> Result<()> {
        let url = format!("{}?id=eq.{}", self.rest_url("users"), user_id);
        Self::send(
            self.request(reqwest::Method::PATCH, url)
                .json(&json!({ "last_login": Utc::now().to_rfc3339() })),
            "Last login update",
        )
        .await?;

        // Login history is best-effort; a failed insert never blocks sign-in.
        let email = self.current_email().await;
        let history = Self::send(
            self.request(reqwest::Method::POST, self.rest_url("login_history"))
                .header("Prefer", "return=minimal")
                .json(&json!({
                    "user_id": user_id,
                    "email": email,
                    "login_time": Utc::now().to_rfc3339(),
                })),
            "Login history insert",
        )
        .await;
        if let Err(e) = history {
            warn!(error = %e, "Failed to record login history");
        }

        Ok(())
    }

    async fn profile_exists(&self, user_id: &str) -> Result<bool> {
        let url = format!(
            "{}?id=eq.{}&select=id",
            self.rest_url("user_profiles"),
            user_id
        );
        let response =
            Self::send(self.request(reqwest::Method::GET, url), "Profile lookup").await?;
        let rows: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| MindforgeError::backend(format!("Malformed profile rows: {e}")))?;
        Ok(!rows.is_empty())
    }

    async fn create_profile(&self, user_id: &str) -> Result<()> {
        Self::send(
            self.request(reqwest::Method::POST, self.rest_url("user_profiles"))
                .header("Prefer", "return=minimal")
                .json(&json!({
                    "id": user_id,
                    "research_count": 0,
                    "normal_count": 0,
                    "total_generations": 0,
                    "last_login": Utc::now().to_rfc3339(),
                })),
            "Profile creation",
        )
        .await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct AuthResponse {
    access_token: Option<String>,
    user: Option<AuthUser>,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
}

#[derive(Deserialize)]
struct ApiKeyRow {
    provider: String,
    api_key: String,
    #[serde(default)]
    last_used: Option<chrono::DateTime<Utc>>,
}
