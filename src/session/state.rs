use std::fmt;

use serde::{Deserialize, Serialize};

/// Role assigned to a user by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
    Moderator,
}

/// Profile data returned by the identity provider.
///
/// Only `id`, `email` and `role` participate in authorization decisions; the
/// remaining fields are carried for display purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Snapshot of the authentication state.
///
/// Replaced wholesale on every transition, never mutated in place. The fields
/// are private so the invariant (authenticated iff both user and token are
/// present) cannot be violated from outside the constructors.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    is_authenticated: bool,
    user: Option<User>,
    token: Option<String>,
}

impl AuthState {
    /// The empty, unauthenticated state.
    pub fn unauthenticated() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            token: None,
        }
    }

    /// An authenticated state carrying both credential and profile.
    pub fn authenticated(token: impl Into<String>, user: User) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
            token: Some(token.into()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// The user asked to log out
    Manual,
    /// The token's expiry claim passed
    Expired,
    /// The server rejected the credential with 401
    Unauthorized,
}

impl fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogoutReason::Manual => write!(f, "manual"),
            LogoutReason::Expired => write!(f, "expired"),
            LogoutReason::Unauthorized => write!(f, "unauthorized"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: "u-1".into(),
            email: "climber@example.com".into(),
            role,
            first_name: Some("Alex".into()),
            last_name: None,
        }
    }

    #[test]
    fn authenticated_state_carries_both_fields() {
        let state = AuthState::authenticated("tok", user(Role::User));
        assert!(state.is_authenticated());
        assert_eq!(state.token(), Some("tok"));
        assert_eq!(state.user().unwrap().id, "u-1");
    }

    #[test]
    fn unauthenticated_state_is_empty() {
        let state = AuthState::unauthenticated();
        assert!(!state.is_authenticated());
        assert!(state.token().is_none());
        assert!(state.user().is_none());
    }

    #[test]
    fn role_serializes_uppercase() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"ADMIN\"");
        let back: Role = serde_json::from_str("\"MODERATOR\"").unwrap();
        assert_eq!(back, Role::Moderator);
    }

    #[test]
    fn user_round_trips_camel_case() {
        let raw = r#"{"id":"u-2","email":"a@b.c","role":"USER","firstName":"Sam"}"#;
        let parsed: User = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.first_name.as_deref(), Some("Sam"));
        assert!(!parsed.is_admin());
    }
}
