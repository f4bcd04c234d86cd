//! Generation request/outcome models and the countdown estimate.

use crate::provider::Provider;
use crate::usage::GenerationKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller-supplied credentials attached to a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialOverride {
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
}

impl CredentialOverride {
    /// Builds an override for a provider using its default top model.
    pub fn for_provider(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key: api_key.into(),
        }
    }
}

/// One generation request. Transient: not persisted beyond the current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub text: String,
    pub research_mode: bool,
    /// Present iff a resolved credential exists for the selected provider.
    pub credential_override: Option<CredentialOverride>,
}

impl GenerationRequest {
    pub fn kind(&self) -> GenerationKind {
        if self.research_mode {
            GenerationKind::Research
        } else {
            GenerationKind::Normal
        }
    }
}

/// The result of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    /// Diagram markup to hand to the renderer.
    pub diagram_markup: String,
    /// The provider that actually served the request. May differ from the
    /// requested override when the backend substitutes its default.
    pub provider_used: String,
}

/// Estimated completion time in seconds, used only for a countdown display.
///
/// Has no effect on request behavior or timeouts.
pub fn estimate_duration_secs(text_len: usize, research_mode: bool) -> u64 {
    let base = (text_len / 50) as u64;
    if research_mode {
        (base * 3).clamp(15, 60)
    } else {
        base.clamp(5, 20)
    }
}

/// Append-only audit record written for every generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLogEntry {
    /// Authenticated user id; `None` for anonymous generations.
    pub user_id: Option<String>,
    /// Durable local session id, so anonymous usage stays attributable.
    pub session_id: String,
    pub generation_kind: GenerationKind,
    pub prompt_text: String,
    pub model_used: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UsageLogEntry {
    pub fn new(
        user_id: Option<String>,
        session_id: impl Into<String>,
        generation_kind: GenerationKind,
        prompt_text: impl Into<String>,
        model_used: Option<String>,
    ) -> Self {
        Self {
            user_id,
            session_id: session_id.into(),
            generation_kind,
            prompt_text: prompt_text.into(),
            model_used,
            created_at: Utc::now(),
        }
    }
}
