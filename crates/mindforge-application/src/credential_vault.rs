//! Credential vault: two-tier resolution of per-provider API keys.
//!
//! Authenticated keys live in account storage behind an in-memory cache
//! that is warmed on sign-in and cleared on sign-out. Anonymous keys live in
//! the local plaintext map. Resolution never fails the caller: backend
//! errors are logged and read as "no key".

use mindforge_core::credential::AccountStore;
use mindforge_core::error::{MindforgeError, Result};
use mindforge_core::identity::SessionIdentity;
use mindforge_core::provider::{validate_key_format, Provider};
use mindforge_infrastructure::LocalKeyStore;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Resolves and persists per-provider API keys.
#[derive(Clone)]
pub struct CredentialVault {
    local: Arc<LocalKeyStore>,
    backend: Arc<dyn AccountStore>,
    /// Warmed account keys; `None` until the first successful fetch after
    /// sign-in.
    cache: Arc<RwLock<Option<HashMap<Provider, String>>>>,
}

impl CredentialVault {
    pub fn new(local: LocalKeyStore, backend: Arc<dyn AccountStore>) -> Self {
        Self {
            local: Arc::new(local),
            backend,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Fetches all account keys and populates the cache.
    ///
    /// A failed fetch leaves the cache cold so a later resolve retries; the
    /// error is logged and swallowed.
    pub async fn warm_cache(&self, user_id: &str) {
        match self.backend.fetch_credentials(user_id).await {
            Ok(records) => {
                let map: HashMap<Provider, String> = records
                    .into_iter()
                    .map(|record| (record.provider, record.api_key))
                    .collect();
                debug!(count = map.len(), "Loaded account API keys");
                *self.cache.write().unwrap() = Some(map);
            }
            Err(e) => {
                warn!(error = %e, "Failed to load account API keys");
            }
        }
    }

    /// Returns the API key for the provider, if one is stored.
    ///
    /// Authenticated identities read the cache, fetching from account
    /// storage on a cold cache as a side effect. Anonymous identities read
    /// the local map. Never fails: errors degrade to `None`.
    pub async fn resolve(&self, provider: Provider, identity: &SessionIdentity) -> Option<String> {
        match &identity.user_id {
            Some(user_id) => {
                {
                    let cache = self.cache.read().unwrap();
                    if let Some(map) = cache.as_ref() {
                        return map.get(&provider).cloned();
                    }
                }

                self.warm_cache(user_id).await;
                self.cache
                    .read()
                    .unwrap()
                    .as_ref()
                    .and_then(|map| map.get(&provider).cloned())
            }
            None => self.local.get(provider),
        }
    }

    /// Validates and persists an API key for the provider.
    ///
    /// Format-invalid keys are rejected before any write. Authenticated
    /// identities write through the account upsert chain; anonymous
    /// identities write the local map.
    pub async fn save(
        &self,
        provider: Provider,
        api_key: &str,
        identity: &SessionIdentity,
    ) -> Result<()> {
        if !validate_key_format(&provider.to_string(), api_key) {
            return Err(MindforgeError::credential_invalid(provider.to_string()));
        }

        match &identity.user_id {
            Some(user_id) => {
                self.backend
                    .upsert_credential(user_id, provider, api_key)
                    .await?;
                // Keep a warmed cache in sync with the write.
                let mut cache = self.cache.write().unwrap();
                if let Some(map) = cache.as_mut() {
                    map.insert(provider, api_key.to_string());
                }
                Ok(())
            }
            None => self.local.set(provider, api_key),
        }
    }

    /// Drops all cached account keys. Called on sign-out; the cache warms
    /// again on the next resolve after sign-in.
    pub fn clear_cache(&self) {
        *self.cache.write().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockBackend;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn vault_with(backend: Arc<MockBackend>) -> (CredentialVault, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let local = LocalKeyStore::with_path(temp_dir.path().join("api_keys.json"));
        (CredentialVault::new(local, backend), temp_dir)
    }

    fn valid_openai_key() -> String {
        format!("sk-{}", "a".repeat(25))
    }

    #[tokio::test]
    async fn test_anonymous_save_and_resolve_use_local_map() {
        let backend = Arc::new(MockBackend::default());
        let (vault, _dir) = vault_with(backend.clone());
        let identity = SessionIdentity::anonymous("sess-1");

        vault
            .save(Provider::OpenAi, &valid_openai_key(), &identity)
            .await
            .unwrap();

        let resolved = vault.resolve(Provider::OpenAi, &identity).await;
        assert_eq!(resolved, Some(valid_openai_key()));
        // Nothing touched the backend.
        assert!(backend.credentials.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_key_rejected_before_write() {
        let backend = Arc::new(MockBackend::default());
        let (vault, _dir) = vault_with(backend.clone());
        let identity = SessionIdentity::authenticated("sess-1", "user-1");

        let err = vault
            .save(Provider::OpenAi, "abc", &identity)
            .await
            .unwrap_err();
        assert!(err.is_credential_invalid());
        assert!(backend.credentials.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_authenticated_resolve_populates_cache() {
        let backend = Arc::new(MockBackend::default());
        backend.credentials.lock().unwrap().insert(
            ("user-1".to_string(), Provider::Anthropic),
            format!("sk-ant-{}", "b".repeat(20)),
        );
        let (vault, _dir) = vault_with(backend.clone());
        let identity = SessionIdentity::authenticated("sess-1", "user-1");

        let first = vault.resolve(Provider::Anthropic, &identity).await;
        assert!(first.is_some());
        let second = vault.resolve(Provider::Anthropic, &identity).await;
        assert_eq!(first, second);
        // The second resolve came from the cache.
        assert_eq!(backend.fetch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_degrades_to_none() {
        let backend = Arc::new(MockBackend::default());
        backend.fail_fetch.store(true, Ordering::SeqCst);
        let (vault, _dir) = vault_with(backend);
        let identity = SessionIdentity::authenticated("sess-1", "user-1");

        assert!(vault.resolve(Provider::Google, &identity).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let backend = Arc::new(MockBackend::default());
        let (vault, _dir) = vault_with(backend.clone());
        let identity = SessionIdentity::authenticated("sess-1", "user-1");

        vault.resolve(Provider::Google, &identity).await;
        vault.clear_cache();
        vault.resolve(Provider::Google, &identity).await;

        assert_eq!(backend.fetch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_authenticated_save_updates_warm_cache() {
        let backend = Arc::new(MockBackend::default());
        let (vault, _dir) = vault_with(backend.clone());
        let identity = SessionIdentity::authenticated("sess-1", "user-1");

        // Warm with an empty account.
        vault.warm_cache("user-1").await;
        vault
            .save(Provider::OpenAi, &valid_openai_key(), &identity)
            .await
            .unwrap();

        // The new key is visible without another fetch.
        let fetches_before = backend.fetch_calls.load(Ordering::SeqCst);
        let resolved = vault.resolve(Provider::OpenAi, &identity).await;
        assert_eq!(resolved, Some(valid_openai_key()));
        assert_eq!(backend.fetch_calls.load(Ordering::SeqCst), fetches_before);
    }
}
