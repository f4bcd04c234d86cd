//! In-memory fakes for the backend service traits, shared across the
//! application test modules.

use async_trait::async_trait;
use mindforge_core::credential::{
    AccountStore, AuthService, AuthSession, CredentialRecord,
};
use mindforge_core::error::{MindforgeError, Result};
use mindforge_core::generation::UsageLogEntry;
use mindforge_core::provider::Provider;
use mindforge_core::usage::UsageCounters;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// In-memory [`AccountStore`] with per-operation failure switches.
#[derive(Default)]
pub(crate) struct MockBackend {
    pub profiles: Mutex<HashSet<String>>,
    pub credentials: Mutex<HashMap<(String, Provider), String>>,
    pub transferred: Mutex<Vec<(String, UsageCounters)>>,
    pub total_increments: Mutex<u32>,
    pub usage_log: Mutex<Vec<UsageLogEntry>>,
    pub last_logins: Mutex<Vec<String>>,
    pub fetch_calls: AtomicU32,
    pub fail_fetch: AtomicBool,
    pub fail_increment: AtomicBool,
    pub fail_add_usage: AtomicBool,
    pub fail_upsert: AtomicBool,
}

#[async_trait]
impl AccountStore for MockBackend {
    async fn fetch_credentials(&self, user_id: &str) -> Result<Vec<CredentialRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(MindforgeError::backend("fetch unavailable"));
        }
        let credentials = self.credentials.lock().unwrap();
        Ok(credentials
            .iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|((_, provider), key)| CredentialRecord::new(*provider, key.clone()))
            .collect())
    }

    async fn upsert_credential(&self, user_id: &str, provider: Provider, api_key: &str) -> Result<()> {
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(MindforgeError::backend("upsert unavailable"));
        }
        self.credentials
            .lock()
            .unwrap()
            .insert((user_id.to_string(), provider), api_key.to_string());
        Ok(())
    }

    async fn add_usage(&self, user_id: &str, counters: &UsageCounters) -> Result<()> {
        if self.fail_add_usage.load(Ordering::SeqCst) {
            return Err(MindforgeError::backend("transfer unavailable"));
        }
        self.transferred
            .lock()
            .unwrap()
            .push((user_id.to_string(), *counters));
        Ok(())
    }

    async fn increment_total_generations(&self, _user_id: &str) -> Result<()> {
        if self.fail_increment.load(Ordering::SeqCst) {
            return Err(MindforgeError::backend("increment unavailable"));
        }
        *self.total_increments.lock().unwrap() += 1;
        Ok(())
    }

    async fn append_usage_log(&self, entry: &UsageLogEntry) -> Result<()> {
        self.usage_log.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn touch_last_login(&self, user_id: &str) -> Result<()> {
        self.last_logins.lock().unwrap().push(user_id.to_string());
        Ok(())
    }

    async fn profile_exists(&self, user_id: &str) -> Result<bool> {
        Ok(self.profiles.lock().unwrap().contains(user_id))
    }

    async fn create_profile(&self, user_id: &str) -> Result<()> {
        self.profiles.lock().unwrap().insert(user_id.to_string());
        Ok(())
    }
}

/// In-memory [`AuthService`].
///
/// Sign-up never creates a profile row, mimicking a backend whose profile
/// trigger did not run.
#[derive(Default)]
pub(crate) struct MockAuth {
    /// Session returned by `restore_session`.
    pub restorable: Mutex<Option<AuthSession>>,
    /// Emails passed to `request_password_reset`.
    pub reset_requests: Mutex<Vec<String>>,
}

#[async_trait]
impl AuthService for MockAuth {
    async fn sign_up(&self, email: &str, _password: &str) -> Result<AuthSession> {
        Ok(AuthSession {
            user_id: format!("user-{email}"),
            email: email.to_string(),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        if password == "wrong" {
            return Err(MindforgeError::backend("invalid login credentials"));
        }
        Ok(AuthSession {
            user_id: format!("user-{email}"),
            email: email.to_string(),
        })
    }

    async fn restore_session(&self) -> Result<Option<AuthSession>> {
        Ok(self.restorable.lock().unwrap().clone())
    }

    async fn request_password_reset(&self, email: &str) -> Result<()> {
        self.reset_requests.lock().unwrap().push(email.to_string());
        Ok(())
    }
}
