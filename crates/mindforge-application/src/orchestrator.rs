//! Generation request orchestrator.
//!
//! Gates a submission on the anonymous quota, attaches a resolved credential
//! when one exists, submits to the generation endpoint, classifies failures
//! into user-facing hints, and records successful generations in the ledger.
//!
//! Concurrent submits are not serialized; when two overlap, the last
//! response to resolve wins for display purposes.

use crate::credential_vault::CredentialVault;
use crate::usage_ledger::UsageLedger;
use mindforge_core::error::MindforgeError;
use mindforge_core::generation::{
    estimate_duration_secs, CredentialOverride, GenerationOutcome, GenerationRequest,
};
use mindforge_core::identity::SessionIdentity;
use mindforge_core::provider::Provider;
use mindforge_core::usage::GenerationKind;
use mindforge_interaction::classify::classify;
use mindforge_interaction::generation_agent::{DiagramGenerator, GenerationApiError};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info};

/// A failed submission: the error plus an optional actionable hint.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SubmitFailure {
    pub error: MindforgeError,
    pub hint: Option<&'static str>,
}

/// A successful submission.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub outcome: GenerationOutcome,
    /// Countdown estimate shown while waiting; cosmetic only.
    pub estimated_secs: u64,
    /// Whether the request carried the user's own API key.
    pub used_personal_key: bool,
    /// Remaining anonymous generations of this kind after recording;
    /// `None` for authenticated identities.
    pub remaining_after: Option<u32>,
}

/// The sign-up prompts shown when an anonymous quota runs out.
fn quota_prompt(kind: GenerationKind) -> &'static str {
    match kind {
        GenerationKind::Research => {
            "You have reached the limit of 2 research mode generations. Sign up to continue using research mode!"
        }
        GenerationKind::Normal => {
            "You have reached the limit of 5 mind map generations. Sign up for unlimited generations!"
        }
    }
}

/// Builds and submits generation requests.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    generator: Arc<dyn DiagramGenerator>,
    ledger: Arc<UsageLedger>,
    vault: Arc<CredentialVault>,
    identity: Arc<RwLock<SessionIdentity>>,
}

impl GenerationOrchestrator {
    pub fn new(
        generator: Arc<dyn DiagramGenerator>,
        ledger: Arc<UsageLedger>,
        vault: Arc<CredentialVault>,
        identity: Arc<RwLock<SessionIdentity>>,
    ) -> Self {
        Self {
            generator,
            ledger,
            vault,
            identity,
        }
    }

    /// Countdown estimate for a submission, in seconds.
    pub fn estimate(text: &str, research_mode: bool) -> u64 {
        estimate_duration_secs(text.len(), research_mode)
    }

    /// Submits one generation request.
    ///
    /// Fails with `QuotaExceeded` before any network call when the
    /// anonymous quota for the kind is exhausted; the caller surfaces the
    /// sign-up prompt carried in the hint.
    pub async fn submit(
        &self,
        text: &str,
        research_mode: bool,
        provider: Provider,
    ) -> Result<GenerationReport, SubmitFailure> {
        let identity = self.identity.read().unwrap().clone();
        let kind = if research_mode {
            GenerationKind::Research
        } else {
            GenerationKind::Normal
        };

        if !self.ledger.check_allowed(kind, &identity) {
            return Err(SubmitFailure {
                error: MindforgeError::quota_exceeded(kind),
                hint: Some(quota_prompt(kind)),
            });
        }

        let credential_override = self
            .vault
            .resolve(provider, &identity)
            .await
            .map(|api_key| CredentialOverride::for_provider(provider, api_key));
        let used_personal_key = credential_override.is_some();
        debug!(%provider, used_personal_key, research_mode, "Built generation request");

        let request = GenerationRequest {
            text: text.to_string(),
            research_mode,
            credential_override,
        };
        let estimated_secs = Self::estimate(text, research_mode);

        let outcome = self
            .generator
            .generate(&request)
            .await
            .map_err(Self::submit_failure)?;

        info!(provider_used = %outcome.provider_used, "Generation succeeded");
        self.ledger
            .record_generation(kind, &identity, text, Some(outcome.provider_used.clone()))
            .await;

        let remaining_after = if identity.is_authenticated() {
            None
        } else {
            Some(self.ledger.get_remaining(kind))
        };

        Ok(GenerationReport {
            outcome,
            estimated_secs,
            used_personal_key,
            remaining_after,
        })
    }

    /// Converts an endpoint failure into a displayed message plus hint.
    fn submit_failure(err: GenerationApiError) -> SubmitFailure {
        match err {
            GenerationApiError::Endpoint { ref body, .. } => {
                let message = match (&body.detail, &body.error) {
                    (Some(detail), _) => format!("Error: {detail}"),
                    (None, Some(error)) => format!("Failed to generate mind map: {error}"),
                    (None, None) => format!("Failed to generate mind map: {}", body.message()),
                };
                SubmitFailure {
                    error: MindforgeError::backend(message),
                    hint: classify(body).hint(),
                }
            }
            other => SubmitFailure {
                error: MindforgeError::backend(format!("Failed to generate mind map: {other}")),
                hint: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockBackend;
    use async_trait::async_trait;
    use mindforge_infrastructure::{LocalKeyStore, UsageStore};
    use mindforge_interaction::generation_agent::FailureBody;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct MockGenerator {
        calls: AtomicU32,
        last_request: Mutex<Option<GenerationRequest>>,
        failure: Mutex<Option<GenerationApiError>>,
    }

    #[async_trait]
    impl DiagramGenerator for MockGenerator {
        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationOutcome, GenerationApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            if let Some(failure) = self.failure.lock().unwrap().take() {
                return Err(failure);
            }
            Ok(GenerationOutcome {
                diagram_markup: "mindmap\n  root((Topic))\n".to_string(),
                provider_used: "mistral".to_string(),
            })
        }
    }

    struct Fixture {
        orchestrator: GenerationOrchestrator,
        generator: Arc<MockGenerator>,
        vault: Arc<CredentialVault>,
        ledger: Arc<UsageLedger>,
        identity: Arc<RwLock<SessionIdentity>>,
        _dir: TempDir,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let backend = Arc::new(MockBackend::default());
        let generator = Arc::new(MockGenerator::default());

        let ledger = Arc::new(UsageLedger::new(
            UsageStore::with_path(temp_dir.path().join("usage.json")),
            backend.clone(),
        ));
        let vault = Arc::new(CredentialVault::new(
            LocalKeyStore::with_path(temp_dir.path().join("api_keys.json")),
            backend,
        ));
        let identity = Arc::new(RwLock::new(SessionIdentity::anonymous("sess-1")));
        let orchestrator = GenerationOrchestrator::new(
            generator.clone(),
            ledger.clone(),
            vault.clone(),
            identity.clone(),
        );

        Fixture {
            orchestrator,
            generator,
            vault,
            ledger,
            identity,
            _dir: temp_dir,
        }
    }

    #[tokio::test]
    async fn test_quota_rejection_happens_before_any_network_call() {
        let fx = fixture();
        let identity = fx.identity.read().unwrap().clone();
        for _ in 0..5 {
            fx.ledger
                .record_generation(GenerationKind::Normal, &identity, "t", None)
                .await;
        }

        let err = fx
            .orchestrator
            .submit("rust", false, Provider::Google)
            .await
            .unwrap_err();

        assert!(err.error.is_quota_exceeded());
        assert!(err.hint.unwrap().contains("Sign up"));
        assert_eq!(fx.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_without_key_uses_default_api() {
        let fx = fixture();
        let report = fx
            .orchestrator
            .submit("rust ownership", false, Provider::Google)
            .await
            .unwrap();

        assert!(!report.used_personal_key);
        assert_eq!(report.outcome.provider_used, "mistral");
        let request = fx.generator.last_request.lock().unwrap().clone().unwrap();
        assert!(request.credential_override.is_none());
    }

    #[tokio::test]
    async fn test_submit_attaches_resolved_credential() {
        let fx = fixture();
        let identity = fx.identity.read().unwrap().clone();
        let key = format!("sk-{}", "a".repeat(25));
        fx.vault
            .save(Provider::OpenAi, &key, &identity)
            .await
            .unwrap();

        let report = fx
            .orchestrator
            .submit("rust ownership", false, Provider::OpenAi)
            .await
            .unwrap();

        assert!(report.used_personal_key);
        let request = fx.generator.last_request.lock().unwrap().clone().unwrap();
        let cred = request.credential_override.unwrap();
        assert_eq!(cred.provider, Provider::OpenAi);
        assert_eq!(cred.model, "gpt-4o");
        assert_eq!(cred.api_key, key);
    }

    #[tokio::test]
    async fn test_success_records_usage_and_reports_remaining() {
        let fx = fixture();
        let report = fx
            .orchestrator
            .submit("rust", false, Provider::Google)
            .await
            .unwrap();

        assert_eq!(report.remaining_after, Some(4));
        assert_eq!(fx.ledger.get_remaining(GenerationKind::Normal), 4);
    }

    #[tokio::test]
    async fn test_authenticated_report_has_no_remaining() {
        let fx = fixture();
        fx.identity.write().unwrap().sign_in("user-1");

        let report = fx
            .orchestrator
            .submit("rust", false, Provider::Google)
            .await
            .unwrap();
        assert_eq!(report.remaining_after, None);
    }

    #[tokio::test]
    async fn test_endpoint_failure_is_classified() {
        let fx = fixture();
        *fx.generator.failure.lock().unwrap() = Some(GenerationApiError::Endpoint {
            status: 500,
            body: FailureBody::parse(r#"{"detail": "invalid api key provided"}"#.to_string()),
        });

        let err = fx
            .orchestrator
            .submit("rust", false, Provider::Google)
            .await
            .unwrap_err();

        assert!(err.error.to_string().contains("invalid api key provided"));
        assert!(err.hint.unwrap().contains("invalid"));
        // A failed generation does not consume quota.
        assert_eq!(fx.ledger.get_remaining(GenerationKind::Normal), 5);
    }

    #[tokio::test]
    async fn test_transport_failure_has_no_hint() {
        let fx = fixture();
        *fx.generator.failure.lock().unwrap() =
            Some(GenerationApiError::Transport("connection refused".to_string()));

        let err = fx
            .orchestrator
            .submit("rust", false, Provider::Google)
            .await
            .unwrap_err();
        assert!(err.hint.is_none());
        assert!(err.error.is_backend());
    }

    #[test]
    fn test_estimate_delegates_to_duration_math() {
        assert_eq!(GenerationOrchestrator::estimate("", false), 5);
        assert_eq!(GenerationOrchestrator::estimate(&"x".repeat(5000), true), 60);
    }
}
