//! Best-effort classification of generation endpoint failures.
//!
//! The endpoint has no typed error contract; this module buckets failures by
//! substring matching on whatever structured fields the body carries. It is
//! deliberately isolated so a typed contract can replace it without touching
//! callers.

use crate::generation_agent::FailureBody;

/// User-facing failure buckets for generation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InsufficientQuota,
    InvalidApiKey,
    ModelNotAvailable,
    Generic,
}

impl FailureKind {
    /// The actionable hint shown alongside the generic error message.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            FailureKind::InsufficientQuota => {
                Some("Your API key has insufficient credits. Please check your account balance.")
            }
            FailureKind::InvalidApiKey => {
                Some("The API key appears to be invalid. Please check and try again.")
            }
            FailureKind::ModelNotAvailable => {
                Some("The requested model is not available with your API key tier.")
            }
            FailureKind::Generic => None,
        }
    }
}

/// Buckets an error body by code, then by substrings of `error` / `detail`.
pub fn classify(body: &FailureBody) -> FailureKind {
    let code = body.code.as_deref().unwrap_or("");
    let error = body.error.as_deref().unwrap_or("");
    let detail = body.detail.as_deref().unwrap_or("");

    if code == "insufficient_quota" || error.contains("quota") || detail.contains("credit") {
        FailureKind::InsufficientQuota
    } else if code == "invalid_api_key" || error.contains("invalid") || detail.contains("invalid")
    {
        FailureKind::InvalidApiKey
    } else if code == "model_not_available" || error.contains("model") || detail.contains("model")
    {
        FailureKind::ModelNotAvailable
    } else {
        FailureKind::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(detail: Option<&str>, error: Option<&str>, code: Option<&str>) -> FailureBody {
        FailureBody {
            detail: detail.map(str::to_string),
            error: error.map(str::to_string),
            code: code.map(str::to_string),
            raw: String::new(),
        }
    }

    #[test]
    fn test_invalid_key_detail() {
        let kind = classify(&body(Some("invalid api key provided"), None, None));
        assert_eq!(kind, FailureKind::InvalidApiKey);
        assert!(kind.hint().unwrap().contains("invalid"));
    }

    #[test]
    fn test_quota_by_code() {
        let kind = classify(&body(None, None, Some("insufficient_quota")));
        assert_eq!(kind, FailureKind::InsufficientQuota);
    }

    #[test]
    fn test_quota_by_credit_substring() {
        let kind = classify(&body(Some("not enough credit remaining"), None, None));
        assert_eq!(kind, FailureKind::InsufficientQuota);
    }

    #[test]
    fn test_model_not_available() {
        let kind = classify(&body(None, Some("model is not supported"), None));
        assert_eq!(kind, FailureKind::ModelNotAvailable);
    }

    #[test]
    fn test_empty_body_is_generic() {
        let kind = classify(&body(None, None, None));
        assert_eq!(kind, FailureKind::Generic);
        assert!(kind.hint().is_none());
    }

    #[test]
    fn test_quota_wins_over_invalid() {
        // "quota" in error takes priority even when "invalid" also appears.
        let kind = classify(&body(Some("invalid state"), Some("quota exceeded"), None));
        assert_eq!(kind, FailureKind::InsufficientQuota);
    }
}
