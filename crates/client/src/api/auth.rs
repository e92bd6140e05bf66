//! Login.
//!
//! The login endpoint has shipped several response shapes:
//!
//! ```json
//! { "data": { "accessToken": "…", "user": { … } } }
//! { "data": { "token": "…", "verifyUser": { … } } }
//! { "token": "…", "user": { … } }
//! { "accessToken": "…", "user": { … } }
//! ```
//!
//! [`parse_login`] accepts all of them. When the user record is missing or
//! lacks an id, the token's claims fill the gap.

use feedme_core::user::User;
use feedme_core::{BearerToken, Email, Session, UserRole};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{instrument, warn};

use crate::client::ApiClient;
use crate::error::{ApiError, json_message};
use crate::jwt;
use crate::transport::ApiRequest;

/// (token field, user field) pairs, tried inside `data` first.
static LOGIN_SHAPES: [(&str, &str); 3] = [
    ("accessToken", "user"),
    ("token", "verifyUser"),
    ("token", "user"),
];

/// Build a session from a login response body.
///
/// # Errors
///
/// Returns `ApiError::Unsuccessful` when no token can be found.
pub fn parse_login(body: &Value) -> Result<Session, ApiError> {
    let data = body.get("data").filter(|d| d.is_object());
    let scopes = data.into_iter().chain(std::iter::once(body));

    let found = scopes
        .flat_map(|scope| {
            LOGIN_SHAPES
                .iter()
                .map(move |&(token_key, user_key)| (scope, token_key, user_key))
        })
        .find_map(|(scope, token_key, user_key)| {
            let token = scope.get(token_key)?.as_str()?.trim();
            (!token.is_empty()).then(|| (token.to_owned(), scope.get(user_key).cloned()))
        });

    let Some((token, user)) = found else {
        return Err(ApiError::Unsuccessful(
            json_message(body).unwrap_or_else(|| "no token in login response".to_string()),
        ));
    };

    let token = BearerToken::new(&token);
    let claims = jwt::decode(token.raw());
    let mut user = user
        .and_then(|u| serde_json::from_value::<User>(u).ok())
        .or_else(|| {
            claims.as_ref().map(|c| {
                User::new(
                    c.id.clone().unwrap_or_default(),
                    c.email.clone().unwrap_or_default(),
                    c.role.unwrap_or_default(),
                )
            })
        })
        .unwrap_or_else(|| User::new("", "", UserRole::default()));

    if let Some(claims) = &claims {
        if user.id.is_empty()
            && let Some(id) = &claims.id
        {
            user.id = id.as_str().into();
        }
        if let Some(role) = claims.role
            && role != user.role
        {
            warn!(token_role = %role, user_role = %user.role, "Token and user record disagree on role");
        }
    }

    Ok(Session::new(user, token))
}

impl ApiClient {
    /// Log in and replace the current session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` or `ApiError::Unsuccessful` for
    /// rejected credentials, and `ApiError::Session` when the new session
    /// could not be persisted (it is active in memory regardless).
    #[instrument(skip(self, email, password), fields(email = %email.masked()))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<Session, ApiError> {
        let request = ApiRequest::post(
            "auth/login",
            json!({ "email": email.as_str(), "password": password.expose_secret() }),
        );
        let body = self.fetch(&request).await?.into_body();
        let session = parse_login(&body)?;

        self.cache().clear().await;
        self.session().login(session.clone())?;
        Ok(session)
    }

    /// End the session and drop cached data.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Session` if the persisted copy could not be removed.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.cache().clear().await;
        self.session().logout()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::jwt::tests::token_with;

    fn user_json() -> Value {
        json!({"_id": "u-1", "name": "Pat", "email": "pat@feedme.test", "role": "provider"})
    }

    #[test]
    fn test_all_login_shapes() {
        let shapes = [
            json!({"success": true, "data": {"accessToken": "t1", "user": user_json()}}),
            json!({"success": true, "data": {"token": "Bearer t1", "verifyUser": user_json()}}),
            json!({"token": "t1", "user": user_json()}),
            json!({"accessToken": "t1", "user": user_json()}),
        ];
        for body in &shapes {
            let session = parse_login(body).unwrap();
            assert_eq!(session.token.raw(), "t1", "shape: {body}");
            assert_eq!(session.user.id.as_str(), "u-1");
            assert_eq!(session.user.role, UserRole::Provider);
        }
    }

    #[test]
    fn test_user_filled_from_claims() {
        let token = token_with(&json!({"id": "u-9", "email": "a@feedme.test", "role": "admin"}));
        let session = parse_login(&json!({"data": {"accessToken": token}})).unwrap();
        assert_eq!(session.user.id.as_str(), "u-9");
        assert_eq!(session.user.role, UserRole::Admin);
    }

    #[test]
    fn test_missing_token_reports_backend_message() {
        let body = json!({
            "success": false,
            "message": "Login failed",
            "errorSources": [{"path": "", "message": "Password is incorrect"}]
        });
        let err = parse_login(&body).unwrap_err();
        assert!(matches!(err, ApiError::Unsuccessful(m) if m == "Password is incorrect"));
    }
}
