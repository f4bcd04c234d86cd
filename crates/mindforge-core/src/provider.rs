//! Generation providers and API key format rules.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// An external generation provider a user can bring their own API key for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Provider {
    Google,
    OpenAi,
    Anthropic,
    Cohere,
}

impl Provider {
    /// The top model requested when a user supplies their own key for this
    /// provider. The backend may still substitute its default.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Google => "gemini-1.5-pro",
            Provider::OpenAi => "gpt-4o",
            Provider::Anthropic => "claude-3-opus",
            Provider::Cohere => "command-r",
        }
    }

    /// All supported providers, in selector order.
    pub fn all() -> Vec<Provider> {
        Provider::iter().collect()
    }
}

/// Format-level validation of an API key for a provider.
///
/// This is a pure check on the key's shape, not a live API call. The
/// `provider` is taken as a string so unknown provider names degrade to a
/// minimal length check instead of being rejected outright.
pub fn validate_key_format(provider: &str, key: &str) -> bool {
    if key.is_empty() {
        return false;
    }

    match Provider::from_str(provider) {
        Ok(Provider::OpenAi) => key.starts_with("sk-") && key.len() > 20,
        Ok(Provider::Anthropic) => key.starts_with("sk-ant-") && key.len() > 20,
        Ok(Provider::Cohere) => key.len() > 20,
        Ok(Provider::Google) => key.starts_with("AIza") || key.len() > 20,
        Err(_) => key.len() > 10,
    }
}
