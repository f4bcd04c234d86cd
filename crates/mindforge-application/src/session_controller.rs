//! Session/identity controller: the Anonymous <-> Authenticated state machine.
//!
//! Owns the current identity and the ordered side effects around sign-in:
//! last-login marker, credential cache warm-up, and (for interactive sign-in
//! only, never startup restore) the anonymous usage transfer. Sign-out is an
//! explicit teardown of account-scoped state rather than a process restart.

use crate::credential_vault::CredentialVault;
use crate::usage_ledger::UsageLedger;
use mindforge_core::credential::{AccountStore, AuthService, AuthSession};
use mindforge_core::error::Result;
use mindforge_core::identity::SessionIdentity;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Grace period between sign-up and the profile existence check, giving the
/// backend's profile trigger time to run before the client self-heals.
pub const SIGNUP_PROFILE_GRACE: Duration = Duration::from_secs(1);

/// Owns the current identity and drives the sign-in/sign-out transitions.
#[derive(Clone)]
pub struct SessionController {
    auth: Arc<dyn AuthService>,
    store: Arc<dyn AccountStore>,
    vault: Arc<CredentialVault>,
    ledger: Arc<UsageLedger>,
    identity: Arc<RwLock<SessionIdentity>>,
    /// Email of the signed-in account; account-scoped state dropped on
    /// sign-out.
    email: Arc<RwLock<Option<String>>>,
    profile_grace: Duration,
}

impl SessionController {
    /// Creates a controller in the Anonymous state.
    ///
    /// # Arguments
    ///
    /// * `session_id` - the durable local session identifier
    pub fn new(
        auth: Arc<dyn AuthService>,
        store: Arc<dyn AccountStore>,
        vault: Arc<CredentialVault>,
        ledger: Arc<UsageLedger>,
        session_id: String,
    ) -> Self {
        Self {
            auth,
            store,
            vault,
            ledger,
            identity: Arc::new(RwLock::new(SessionIdentity::anonymous(session_id))),
            email: Arc::new(RwLock::new(None)),
            profile_grace: SIGNUP_PROFILE_GRACE,
        }
    }

    /// Overrides the sign-up grace period (for testing).
    pub fn with_profile_grace(mut self, grace: Duration) -> Self {
        self.profile_grace = grace;
        self
    }

    /// A snapshot of the current identity.
    pub fn identity(&self) -> SessionIdentity {
        self.identity.read().unwrap().clone()
    }

    /// Shared identity handle, injected into consumers that need the live
    /// state rather than a snapshot.
    pub fn identity_handle(&self) -> Arc<RwLock<SessionIdentity>> {
        self.identity.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.read().unwrap().is_authenticated()
    }

    /// Email of the signed-in account, if any.
    pub fn email(&self) -> Option<String> {
        self.email.read().unwrap().clone()
    }

    /// Restores a pre-existing backend session at startup.
    ///
    /// A restored session performs the sign-in side effects except the usage
    /// transfer, which only an interactive sign-in triggers. A failed
    /// restore leaves the controller anonymous and is not an error.
    pub async fn startup(&self) -> Result<()> {
        match self.auth.restore_session().await {
            Ok(Some(session)) => {
                info!(user_id = %session.user_id, "Restored existing session");
                self.apply_sign_in(session, false).await;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Session restore failed, staying anonymous");
            }
        }
        Ok(())
    }

    /// Interactive sign-in. Side effects, in order: set identity, persist
    /// the last-login marker, warm the credential cache, transfer anonymous
    /// usage.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let session = self.auth.sign_in(email, password).await?;
        self.apply_sign_in(session.clone(), true).await;
        Ok(session)
    }

    /// Creates a new account, then verifies the backend's profile trigger
    /// actually ran and self-heals if it did not.
    ///
    /// The verification waits a fixed grace period rather than polling;
    /// race-tolerant, not race-free.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession> {
        let session = self.auth.sign_up(email, password).await?;

        self.ensure_profile(&session.user_id).await;
        self.apply_sign_in(session.clone(), true).await;
        Ok(session)
    }

    /// Explicit sign-out: identity back to Anonymous, credential cache
    /// cleared, account-scoped state dropped.
    pub fn sign_out(&self) {
        info!("Signing out");
        self.identity.write().unwrap().sign_out();
        *self.email.write().unwrap() = None;
        self.vault.clear_cache();
    }

    /// Requests a password reset email. Best-effort.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        self.auth.request_password_reset(email).await
    }

    async fn apply_sign_in(&self, session: AuthSession, interactive: bool) {
        {
            let mut identity = self.identity.write().unwrap();
            identity.sign_in(session.user_id.clone());
        }
        *self.email.write().unwrap() = Some(session.email.clone());

        if let Err(e) = self.store.touch_last_login(&session.user_id).await {
            warn!(error = %e, "Failed to update last-login marker");
        }

        self.vault.warm_cache(&session.user_id).await;

        if interactive {
            if let Err(e) = self.ledger.transfer_to_account(&session.user_id).await {
                warn!(error = %e, "Anonymous usage transfer failed");
            }
        }
    }

    async fn ensure_profile(&self, user_id: &str) {
        sleep(self.profile_grace).await;

        match self.store.profile_exists(user_id).await {
            Ok(true) => {}
            Ok(false) => {
                info!(user_id = %user_id, "Profile row missing after sign-up, creating it");
                if let Err(e) = self.store.create_profile(user_id).await {
                    warn!(error = %e, "Fallback profile creation failed");
                }
            }
            Err(e) => {
                warn!(error = %e, "Profile verification failed");
            }
        }
    }
}
