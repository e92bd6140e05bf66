//! Error types for the REST client.

use serde_json::Value;
use thiserror::Error;

use crate::session::{AuthError, SessionError};

/// Longest raw body excerpt carried in an error message.
const BODY_EXCERPT_CHARS: usize = 200;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Resource not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The backend rejected our credentials (HTTP 401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// 2xx response whose envelope reports failure.
    #[error("Request unsuccessful: {0}")]
    Unsuccessful(String),

    /// Request rejected before sending.
    #[error("Invalid request: {0}")]
    Invalid(String),

    /// No usable session for an authenticated request.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Session could not be persisted.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    /// Whether the error means the resource does not exist.
    ///
    /// Besides 404s this matches any backend message saying "not found",
    /// which the backend also uses for deleted records on 2xx and 400
    /// responses.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::Status { status: 404, .. } => true,
            Self::Status { message, .. } | Self::Unsuccessful(message) => {
                message.to_lowercase().contains("not found")
            }
            _ => false,
        }
    }

    /// Whether the error comes from the local session rather than the
    /// backend.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// Human-readable message from an error response body.
///
/// Prefers `errorSources[0].message`, then `message`, then the start of the
/// raw body.
#[must_use]
pub fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body)
        && let Some(message) = json_message(&json)
    {
        return message;
    }
    let excerpt: String = body.trim().chars().take(BODY_EXCERPT_CHARS).collect();
    if excerpt.is_empty() {
        "empty response".to_string()
    } else {
        excerpt
    }
}

/// `errorSources[0].message` or `message` of a JSON body.
#[must_use]
pub fn json_message(json: &Value) -> Option<String> {
    json.pointer("/errorSources/0/message")
        .and_then(Value::as_str)
        .or_else(|| json.get("message").and_then(Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(ApiError::NotFound("orders/o-1".into()).is_not_found());
        assert!(
            ApiError::Status {
                status: 404,
                message: "gone".into()
            }
            .is_not_found()
        );
        assert!(
            ApiError::Status {
                status: 400,
                message: "Order Not Found".into()
            }
            .is_not_found()
        );
        assert!(ApiError::Unsuccessful("order not found".into()).is_not_found());
        assert!(
            !ApiError::Status {
                status: 500,
                message: "boom".into()
            }
            .is_not_found()
        );
        assert!(!ApiError::Auth(AuthError::MissingToken).is_not_found());
    }

    #[test]
    fn test_error_message_sources() {
        let body = r#"{"message":"Validation failed","errorSources":[{"path":"email","message":"Invalid email"}]}"#;
        assert_eq!(error_message(body), "Invalid email");
        assert_eq!(error_message(r#"{"message":"Order not found"}"#), "Order not found");
        assert_eq!(error_message("<html>502</html>"), "<html>502</html>");
        assert_eq!(error_message(""), "empty response");
        assert_eq!(error_message(&"x".repeat(500)).len(), 200);
    }
}
