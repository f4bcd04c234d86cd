//! Session identity domain model.
//!
//! A browser-profile-style identity: a long-lived local session id that
//! attributes anonymous usage, plus an optional authenticated user id.

use serde::{Deserialize, Serialize};

/// The current identity of this client profile.
///
/// `session_id` is generated once per profile and persists indefinitely.
/// `user_id` is present iff a valid backend session exists; exactly one of
/// {anonymous, authenticated} holds at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// Durable local session identifier (UUID), created on first run.
    pub session_id: String,
    /// Backend user id when authenticated, `None` when anonymous.
    pub user_id: Option<String>,
}

impl SessionIdentity {
    /// Creates an anonymous identity with the given session id.
    pub fn anonymous(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: None,
        }
    }

    /// Creates an authenticated identity.
    pub fn authenticated(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: Some(user_id.into()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Transitions to authenticated, keeping the durable session id.
    pub fn sign_in(&mut self, user_id: impl Into<String>) {
        self.user_id = Some(user_id.into());
    }

    /// Transitions back to anonymous, keeping the durable session id.
    pub fn sign_out(&mut self) {
        self.user_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_to_authenticated_and_back() {
        let mut identity = SessionIdentity::anonymous("sess-1");
        assert!(!identity.is_authenticated());

        identity.sign_in("user-42");
        assert!(identity.is_authenticated());
        assert_eq!(identity.user_id.as_deref(), Some("user-42"));
        // The local session id survives the transition.
        assert_eq!(identity.session_id, "sess-1");

        identity.sign_out();
        assert!(!identity.is_authenticated());
        assert_eq!(identity.session_id, "sess-1");
    }
}
