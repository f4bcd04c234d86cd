//! Command implementations and shared wiring.

pub mod auth;
pub mod generate;
pub mod keys;
pub mod usage;

use anyhow::Result;
use mindforge_application::{
    CredentialVault, GenerationOrchestrator, SessionController, UsageLedger,
};
use mindforge_infrastructure::{
    AuthTokenStore, ConfigStore, LocalKeyStore, SessionIdStore, UsageStore,
};
use mindforge_interaction::{GenerationApiAgent, RestAccountBackend};
use std::sync::Arc;

/// Everything a command needs, wired once per invocation.
pub struct AppContext {
    pub controller: SessionController,
    pub orchestrator: GenerationOrchestrator,
    pub ledger: Arc<UsageLedger>,
    pub vault: Arc<CredentialVault>,
    pub backend: Arc<RestAccountBackend>,
    pub token_store: AuthTokenStore,
}

/// Builds the service graph and restores any persisted session.
pub async fn build_context() -> Result<AppContext> {
    let config = ConfigStore::new();
    let token_store = AuthTokenStore::new()?;
    let backend = Arc::new(
        RestAccountBackend::from_config(&config).with_access_token(token_store.load()),
    );

    let session_id = SessionIdStore::new()?.load_or_create()?;
    let ledger = Arc::new(UsageLedger::new(UsageStore::new()?, backend.clone()));
    let vault = Arc::new(CredentialVault::new(LocalKeyStore::new()?, backend.clone()));

    let controller = SessionController::new(
        backend.clone(),
        backend.clone(),
        vault.clone(),
        ledger.clone(),
        session_id,
    );
    controller.startup().await?;

    let generator = Arc::new(GenerationApiAgent::from_config(&config));
    let orchestrator = GenerationOrchestrator::new(
        generator,
        ledger.clone(),
        vault.clone(),
        controller.identity_handle(),
    );

    Ok(AppContext {
        controller,
        orchestrator,
        ledger,
        vault,
        backend,
        token_store,
    })
}
