//! Usage ledger: anonymous quota enforcement and generation accounting.
//!
//! Anonymous profiles are capped per generation category; authenticated
//! accounts are not capped client-side but get their totals incremented
//! remotely. Counter persistence is advisory: storage failures degrade to
//! logging, never to a blocked generation.

use mindforge_core::generation::UsageLogEntry;
use mindforge_core::identity::SessionIdentity;
use mindforge_core::credential::AccountStore;
use mindforge_core::error::Result;
use mindforge_core::usage::{GenerationKind, UsageCounters};
use mindforge_infrastructure::UsageStore;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Tracks generation counts and enforces the anonymous quota.
#[derive(Clone)]
pub struct UsageLedger {
    store: Arc<UsageStore>,
    backend: Arc<dyn AccountStore>,
    /// Cached counters loaded from storage.
    /// Uses RwLock for thread-safe lazy loading.
    counters: Arc<RwLock<Option<UsageCounters>>>,
}

impl UsageLedger {
    pub fn new(store: UsageStore, backend: Arc<dyn AccountStore>) -> Self {
        Self {
            store: Arc::new(store),
            backend,
            counters: Arc::new(RwLock::new(None)),
        }
    }

    /// Loads the counters from storage if not already cached.
    fn load(&self) -> UsageCounters {
        {
            let read_lock = self.counters.read().unwrap();
            if let Some(cached) = *read_lock {
                return cached;
            }
        }

        let loaded = self.store.load();

        {
            let mut write_lock = self.counters.write().unwrap();
            *write_lock = Some(loaded);
        }

        loaded
    }

    /// Re-reads the durable file, reconciling changes made by another
    /// process. Eventual, not synchronized.
    pub fn refresh(&self) -> UsageCounters {
        let loaded = self.store.load();
        let mut write_lock = self.counters.write().unwrap();
        *write_lock = Some(loaded);
        loaded
    }

    /// Remaining anonymous generations for the kind, never negative.
    pub fn get_remaining(&self, kind: GenerationKind) -> u32 {
        self.load().remaining(kind)
    }

    /// Whether a generation of this kind may proceed for the identity.
    ///
    /// Authenticated identities are never capped client-side.
    pub fn check_allowed(&self, kind: GenerationKind, identity: &SessionIdentity) -> bool {
        if identity.is_authenticated() {
            return true;
        }
        self.load().allows(kind)
    }

    /// Records one completed generation.
    ///
    /// Authenticated: remote counter increment plus the audit log write; a
    /// failed remote increment falls back to the local counter so the
    /// generation is still accounted somewhere. Anonymous: local counter
    /// plus the audit log write.
    pub async fn record_generation(
        &self,
        kind: GenerationKind,
        identity: &SessionIdentity,
        prompt_text: &str,
        model_used: Option<String>,
    ) {
        match &identity.user_id {
            Some(user_id) => {
                if let Err(e) = self.backend.increment_total_generations(user_id).await {
                    warn!(error = %e, "Remote usage increment failed, falling back to local counter");
                    self.bump_local(kind);
                }
            }
            None => self.bump_local(kind),
        }

        let entry = UsageLogEntry::new(
            identity.user_id.clone(),
            identity.session_id.clone(),
            kind,
            prompt_text,
            model_used,
        );
        if let Err(e) = self.backend.append_usage_log(&entry).await {
            warn!(error = %e, "Failed to append usage log entry");
        }
    }

    /// Moves accumulated anonymous counts into the account totals, then
    /// zeroes the local counters.
    ///
    /// Idempotent: with already-zeroed local counts this is a no-op and no
    /// backend call is made. The local reset and the remote add are not one
    /// transaction; a crash between them leaves the counts advisory-stale.
    pub async fn transfer_to_account(&self, user_id: &str) -> Result<()> {
        let counters = self.refresh();
        if counters.is_empty() {
            debug!("No anonymous usage to transfer");
            return Ok(());
        }

        self.backend.add_usage(user_id, &counters).await?;

        let mut cleared = counters;
        cleared.reset();
        self.save_local(cleared);
        Ok(())
    }

    fn bump_local(&self, kind: GenerationKind) {
        let mut counters = self.load();
        counters.record(kind);
        self.save_local(counters);
    }

    /// Persists and caches new counter values. Storage failures are logged
    /// and otherwise ignored.
    fn save_local(&self, counters: UsageCounters) {
        if let Err(e) = self.store.save(&counters) {
            warn!(error = %e, "Failed to persist usage counters");
        }
        let mut write_lock = self.counters.write().unwrap();
        *write_lock = Some(counters);
    }
}
