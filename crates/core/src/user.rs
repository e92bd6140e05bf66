//! Users, bearer tokens and the authenticated session.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::de::{lenient_datetime, null_default};
use crate::types::{UserId, UserRole};

const BEARER_PREFIX: &str = "Bearer ";

/// A platform account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: UserId,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    /// Stored as sent; the backend does not guarantee a valid address.
    #[serde(default, deserialize_with = "null_default")]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub role: UserRole,
    #[serde(default, deserialize_with = "null_default")]
    pub is_blocked: bool,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// A user with only id, email and role, as decoded from a token.
    #[must_use]
    pub fn new(id: impl Into<UserId>, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            email: email.into(),
            phone: None,
            address: None,
            role,
            is_blocked: false,
            created_at: None,
            updated_at: None,
        }
    }
}

/// An access token for the `Authorization` header.
///
/// The backend hands tokens out both with and without the `Bearer ` prefix;
/// [`BearerToken`] stores the bare token and adds the prefix exactly once.
#[derive(Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    /// Wrap a token, stripping any `Bearer ` prefix.
    #[must_use]
    pub fn new(token: &str) -> Self {
        let token = token.trim();
        let bare = token.strip_prefix(BEARER_PREFIX).unwrap_or(token).trim();
        Self(SecretString::from(bare.to_owned()))
    }

    /// The token without prefix.
    #[must_use]
    pub fn raw(&self) -> &str {
        self.0.expose_secret()
    }

    /// `Authorization` header value: `Bearer <token>`.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("{BEARER_PREFIX}{}", self.raw())
    }

    /// Whether the token is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw().is_empty()
    }

    /// First characters of the token, for logs.
    #[must_use]
    pub fn preview(&self) -> String {
        let head: String = self.raw().chars().take(8).collect();
        format!("{head}...")
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

impl PartialEq for BearerToken {
    fn eq(&self, other: &Self) -> bool {
        self.raw() == other.raw()
    }
}

impl Eq for BearerToken {}

/// The logged-in user and their token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: BearerToken,
}

impl Session {
    #[must_use]
    pub const fn new(user: User, token: BearerToken) -> Self {
        Self { user, token }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_bearer_prefix_added_once() {
        let bare = BearerToken::new("abc.def.ghi");
        assert_eq!(bare.header_value(), "Bearer abc.def.ghi");

        let prefixed = BearerToken::new("Bearer abc.def.ghi");
        assert_eq!(prefixed.header_value(), "Bearer abc.def.ghi");
        assert_eq!(prefixed.raw(), "abc.def.ghi");
        assert_eq!(bare, prefixed);
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken::new("super-secret-token");
        let debug = format!("{token:?}");
        assert!(!debug.contains("super-secret"));
        assert_eq!(token.preview(), "super-se...");
        assert!(BearerToken::new("  ").is_empty());
    }

    #[test]
    fn test_user_from_backend_json() {
        let user: User = serde_json::from_value(json!({
            "_id": "u-1",
            "name": "Ada",
            "email": "ada@example.com",
            "role": "user",
            "isBlocked": null,
            "createdAt": "2024-05-01T10:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(user.role, UserRole::Customer);
        assert!(!user.is_blocked);
        assert!(user.created_at.is_some());

        let stored = serde_json::to_value(&user).unwrap();
        let back: User = serde_json::from_value(stored).unwrap();
        assert_eq!(back, user);
    }
}
