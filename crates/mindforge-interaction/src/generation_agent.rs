//! GenerationApiAgent - REST client for the mind map generation endpoint.
//!
//! Posts the user's text to `/generate_map` and returns the diagram markup.
//! Configuration priority: environment variables > config.toml > defaults.

use async_trait::async_trait;
use mindforge_core::generation::{GenerationOutcome, GenerationRequest};
use mindforge_infrastructure::ConfigStore;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GENERATE_PATH: &str = "/generate_map";

/// Errors from the generation endpoint.
#[derive(Debug, Error)]
pub enum GenerationApiError {
    /// The request never produced an HTTP response.
    #[error("Generation request failed: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("Generation endpoint error ({status}): {}", body.message())]
    Endpoint { status: u16, body: FailureBody },

    /// The success response could not be decoded.
    #[error("Failed to parse generation response: {0}")]
    InvalidResponse(String),
}

/// The loosely-structured error body the endpoint returns on failure.
///
/// None of the fields are guaranteed; the raw body is kept so unclassifiable
/// responses still surface something readable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FailureBody {
    pub detail: Option<String>,
    pub error: Option<String>,
    pub code: Option<String>,
    #[serde(skip)]
    pub raw: String,
}

impl FailureBody {
    /// Parses an error body, tolerating non-JSON responses.
    pub fn parse(raw: String) -> Self {
        let mut body: FailureBody = serde_json::from_str(&raw).unwrap_or_default();
        body.raw = raw;
        body
    }

    /// The most specific message available.
    pub fn message(&self) -> &str {
        self.detail
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or(&self.raw)
    }
}

/// Generates diagram markup from input text.
///
/// The orchestrator depends on this trait so tests can substitute a stub for
/// the HTTP client.
#[async_trait]
pub trait DiagramGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationApiError>;
}

/// HTTP client for the hosted generation endpoint.
#[derive(Clone)]
pub struct GenerationApiAgent {
    client: Client,
    base_url: String,
}

impl GenerationApiAgent {
    /// Creates an agent for the given endpoint base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Creates an agent from config.toml / environment configuration.
    pub fn from_config(config: &ConfigStore) -> Self {
        Self::new(config.get().generation_url)
    }

    fn build_payload(request: &GenerationRequest) -> MapRequest {
        match &request.credential_override {
            Some(cred) => MapRequest {
                text: request.text.clone(),
                research_mode: request.research_mode,
                api_key: Some(cred.api_key.clone()),
                provider: Some(cred.provider.to_string()),
                model: Some(cred.model.clone()),
                use_user_api: true,
            },
            None => MapRequest {
                text: request.text.clone(),
                research_mode: request.research_mode,
                api_key: None,
                provider: None,
                model: None,
                use_user_api: false,
            },
        }
    }
}

#[async_trait]
impl DiagramGenerator for GenerationApiAgent {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationApiError> {
        let payload = Self::build_payload(request);
        let url = format!("{}{}", self.base_url, GENERATE_PATH);
        debug!(url = %url, use_user_api = payload.use_user_api, "Submitting generation request");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| GenerationApiError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(GenerationApiError::Endpoint {
                status: status.as_u16(),
                body: FailureBody::parse(raw),
            });
        }

        let parsed: MapResponse = response
            .json()
            .await
            .map_err(|err| GenerationApiError::InvalidResponse(err.to_string()))?;

        Ok(GenerationOutcome {
            diagram_markup: parsed.mermaid,
            provider_used: parsed.api_used.unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

#[derive(Serialize)]
struct MapRequest {
    text: String,
    research_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    use_user_api: bool,
}

#[derive(Deserialize)]
struct MapResponse {
    mermaid: String,
    #[serde(default)]
    api_used: Option<String>,
}
