//! Authentication snapshot and the predicates that gate remote calls

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who is signed in, and the tokens issued for them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable subject identifier issued by the identity provider
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Token sent as `Authorization: Bearer <id_token>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl Identity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            username: None,
            access_token: None,
            id_token: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_id_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(token.into());
        self
    }
}

/// Process-wide session snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub is_authenticated: bool,
    /// True until the persisted session has been checked at startup
    pub is_loading: bool,
    pub identity: Option<Identity>,
}

impl AuthState {
    /// State at process start, before the persisted session is read
    pub fn initial() -> Self {
        Self {
            is_authenticated: false,
            is_loading: true,
            identity: None,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            is_authenticated: false,
            is_loading: false,
            identity: None,
        }
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            is_authenticated: true,
            is_loading: false,
            identity: Some(identity),
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .map(|i| i.subject.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn username(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .and_then(|i| i.username.as_deref())
            .filter(|s| !s.is_empty())
    }

    pub fn id_token(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .and_then(|i| i.id_token.as_deref())
            .filter(|s| !s.is_empty())
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Credential an operation needs before it may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Signed in with an id token for the bearer header
    IdToken,
    /// Signed in with a subject identifier
    Subject,
    /// Signed in with a username
    Username,
}

impl Requirement {
    pub fn is_satisfied_by(&self, state: &AuthState) -> bool {
        if !state.is_authenticated {
            return false;
        }
        match self {
            Requirement::IdToken => state.id_token().is_some(),
            Requirement::Subject => state.subject().is_some(),
            Requirement::Username => state.username().is_some(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Requirement::IdToken => "id token",
            Requirement::Subject => "subject",
            Requirement::Username => "username",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_is_satisfied_while_signed_out() {
        let mut state = AuthState::signed_in(Identity::new("sub").with_id_token("tok"));
        state.is_authenticated = false;
        for req in [
            Requirement::IdToken,
            Requirement::Subject,
            Requirement::Username,
        ] {
            assert!(!req.is_satisfied_by(&state), "{req:?}");
        }
    }

    #[test]
    fn test_requirements_check_their_credential() {
        let state = AuthState::signed_in(Identity::new("sub-1"));
        assert!(Requirement::Subject.is_satisfied_by(&state));
        assert!(!Requirement::IdToken.is_satisfied_by(&state));
        assert!(!Requirement::Username.is_satisfied_by(&state));

        let state = AuthState::signed_in(
            Identity::new("sub-1")
                .with_username("alice")
                .with_id_token("tok"),
        );
        assert!(Requirement::IdToken.is_satisfied_by(&state));
        assert!(Requirement::Username.is_satisfied_by(&state));
    }

    #[test]
    fn test_empty_token_counts_as_missing() {
        let state = AuthState::signed_in(Identity::new("sub").with_id_token(""));
        assert!(!Requirement::IdToken.is_satisfied_by(&state));
    }

    #[test]
    fn test_identity_json_omits_absent_tokens() {
        let json = serde_json::to_value(Identity::new("s").with_username("bob")).unwrap();
        assert_eq!(json, serde_json::json!({"subject": "s", "username": "bob"}));
    }
}
