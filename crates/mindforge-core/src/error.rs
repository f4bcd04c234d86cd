//! Error types for the mindforge application.

use crate::usage::GenerationKind;
use thiserror::Error;

/// A shared error type for the entire mindforge application.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone)]
pub enum MindforgeError {
    /// Anonymous generation quota reached for the given kind
    #[error("Generation limit reached: {limit} {kind} generations")]
    QuotaExceeded { kind: GenerationKind, limit: u32 },

    /// API key failed format validation before submission
    #[error("Invalid API key format for provider '{provider}'")]
    CredentialInvalid { provider: String },

    /// Network or backend failure (generation endpoint or account backend)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Diagram renderer failure
    #[error("Render error: {0}")]
    Render(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "JSON", "TOML", etc.
        message: String,
    },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MindforgeError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a QuotaExceeded error for the given generation kind
    pub fn quota_exceeded(kind: GenerationKind) -> Self {
        Self::QuotaExceeded {
            kind,
            limit: kind.anonymous_limit(),
        }
    }

    /// Creates a CredentialInvalid error
    pub fn credential_invalid(provider: impl Into<String>) -> Self {
        Self::CredentialInvalid {
            provider: provider.into(),
        }
    }

    /// Creates a Backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Creates a Render error
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a QuotaExceeded error
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }

    /// Check if this is a CredentialInvalid error
    pub fn is_credential_invalid(&self) -> bool {
        matches!(self, Self::CredentialInvalid { .. })
    }

    /// Check if this is a Backend error
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_))
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for MindforgeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MindforgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (transitional, should be removed eventually)
impl From<anyhow::Error> for MindforgeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Conversion from String (for error messages)
impl From<String> for MindforgeError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, MindforgeError>`.
pub type Result<T> = std::result::Result<T, MindforgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exceeded_carries_limit() {
        let err = MindforgeError::quota_exceeded(GenerationKind::Research);
        assert!(err.is_quota_exceeded());
        match err {
            MindforgeError::QuotaExceeded { limit, .. } => assert_eq!(limit, 2),
            _ => panic!("Expected QuotaExceeded"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = MindforgeError::from(io_err);
        assert!(err.is_io());
    }

    #[test]
    fn test_credential_invalid_display() {
        let err = MindforgeError::credential_invalid("openai");
        assert!(err.to_string().contains("openai"));
    }
}
