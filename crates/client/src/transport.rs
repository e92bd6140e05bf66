//! Transports and the ordered fallback chain.
//!
//! A mutation can reach the backend two ways: through the cached client
//! ([`Transport::Client`]) or as a raw request with explicit headers
//! ([`Transport::Direct`]). A [`FallbackChain`] tries them in order and
//! classifies every attempt with one rule set:
//!
//! | Attempt result                          | Chain action          |
//! |-----------------------------------------|-----------------------|
//! | success                                 | stop, `Completed`     |
//! | not found, policy `IdempotentDelete`    | stop, `AlreadyGone`   |
//! | local authentication failure            | stop, error           |
//! | anything else                           | try next transport    |

use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::Tag;
use crate::client::ApiClient;
use crate::error::ApiError;

/// How a request reaches the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Through the client: session auth header, cache invalidation on success.
    Client,
    /// Raw request to the direct base URL with explicit JSON and auth headers.
    Direct,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Direct => write!(f, "direct"),
        }
    }
}

/// A transport-independent request description.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base, e.g. `orders/o-1/tracking`.
    pub path: String,
    pub body: Option<Value>,
    /// Require a logged-in session before sending.
    pub auth: bool,
    /// Treat a 2xx response without `success: true` as a failure.
    pub require_success: bool,
    /// Tags the client transport invalidates on success.
    pub invalidates: Vec<Tag>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            auth: false,
            require_success: false,
            invalidates: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).with_body(body)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub const fn authenticated(mut self) -> Self {
        self.auth = true;
        self
    }

    #[must_use]
    pub const fn requiring_success(mut self) -> Self {
        self.require_success = true;
        self
    }

    #[must_use]
    pub fn invalidating(mut self, tag: Tag) -> Self {
        self.invalidates.push(tag);
        self
    }
}

/// How attempt outcomes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutcomePolicy {
    /// Only a successful response completes the chain.
    #[default]
    Strict,
    /// A not-found response also completes it: the resource is already gone.
    IdempotentDelete,
}

/// Successful end of a chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome {
    Completed { transport: Transport, body: Value },
    AlreadyGone { transport: Transport },
}

impl ChainOutcome {
    /// The transport that ended the chain.
    #[must_use]
    pub const fn transport(&self) -> Transport {
        match self {
            Self::Completed { transport, .. } | Self::AlreadyGone { transport } => *transport,
        }
    }
}

/// Every attempt failed (or one failed in a way that stops the chain).
#[derive(Debug, Error)]
#[error("{}", describe_attempts(.attempts))]
pub struct FallbackError {
    pub attempts: Vec<(Transport, ApiError)>,
}

impl FallbackError {
    /// The last attempt's error.
    #[must_use]
    pub fn last_error(&self) -> Option<&ApiError> {
        self.attempts.last().map(|(_, e)| e)
    }

    /// Whether the chain stopped on a local authentication failure.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        self.last_error().is_some_and(ApiError::is_auth)
    }
}

fn describe_attempts(attempts: &[(Transport, ApiError)]) -> String {
    if attempts.is_empty() {
        return "no transports configured".to_string();
    }
    attempts
        .iter()
        .map(|(transport, error)| format!("{transport}: {error}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// What to do after one attempt.
#[derive(Debug)]
enum Step {
    Done(ChainOutcome),
    Stop(ApiError),
    Next(ApiError),
}

fn classify(policy: OutcomePolicy, transport: Transport, result: Result<Value, ApiError>) -> Step {
    match result {
        Ok(body) => Step::Done(ChainOutcome::Completed { transport, body }),
        Err(e) if policy == OutcomePolicy::IdempotentDelete && e.is_not_found() => {
            Step::Done(ChainOutcome::AlreadyGone { transport })
        }
        Err(e) if e.is_auth() => Step::Stop(e),
        Err(e) => Step::Next(e),
    }
}

/// Ordered list of transports tried for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackChain {
    pub transports: Vec<Transport>,
    pub policy: OutcomePolicy,
}

impl FallbackChain {
    #[must_use]
    pub const fn new(transports: Vec<Transport>, policy: OutcomePolicy) -> Self {
        Self { transports, policy }
    }

    /// Send `request` through each transport until one completes.
    ///
    /// # Errors
    ///
    /// Returns `FallbackError` listing every failed attempt.
    pub async fn run(
        &self,
        client: &ApiClient,
        request: &ApiRequest,
    ) -> Result<ChainOutcome, FallbackError> {
        let mut attempts = Vec::new();
        for &transport in &self.transports {
            let result = client.send(transport, request).await;
            match classify(self.policy, transport, result) {
                Step::Done(outcome) => {
                    info!(
                        %transport,
                        method = %request.method,
                        path = %request.path,
                        already_gone = matches!(outcome, ChainOutcome::AlreadyGone { .. }),
                        "Request completed"
                    );
                    return Ok(outcome);
                }
                Step::Stop(error) => {
                    warn!(%transport, path = %request.path, %error, "Request stopped");
                    attempts.push((transport, error));
                    break;
                }
                Step::Next(error) => {
                    warn!(%transport, path = %request.path, %error, "Attempt failed, trying next transport");
                    attempts.push((transport, error));
                }
            }
        }
        Err(FallbackError { attempts })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::session::AuthError;

    fn not_found() -> ApiError {
        ApiError::NotFound("order".into())
    }

    #[test]
    fn test_classify_success() {
        let step = classify(OutcomePolicy::Strict, Transport::Direct, Ok(json!({"ok": 1})));
        assert!(matches!(
            step,
            Step::Done(ChainOutcome::Completed { transport: Transport::Direct, .. })
        ));
    }

    #[test]
    fn test_not_found_depends_on_policy() {
        let strict = classify(OutcomePolicy::Strict, Transport::Client, Err(not_found()));
        assert!(matches!(strict, Step::Next(_)));

        let delete = classify(OutcomePolicy::IdempotentDelete, Transport::Client, Err(not_found()));
        assert!(matches!(
            delete,
            Step::Done(ChainOutcome::AlreadyGone { transport: Transport::Client })
        ));
    }

    #[test]
    fn test_auth_failure_stops() {
        let step = classify(
            OutcomePolicy::Strict,
            Transport::Direct,
            Err(ApiError::Auth(AuthError::MissingToken)),
        );
        assert!(matches!(step, Step::Stop(_)));

        let backend_401 = classify(
            OutcomePolicy::Strict,
            Transport::Direct,
            Err(ApiError::Unauthorized("jwt expired".into())),
        );
        assert!(matches!(backend_401, Step::Next(_)));
    }

    #[test]
    fn test_fallback_error_names_every_attempt() {
        let err = FallbackError {
            attempts: vec![
                (Transport::Direct, ApiError::RateLimited(5)),
                (
                    Transport::Client,
                    ApiError::Status {
                        status: 500,
                        message: "boom".into(),
                    },
                ),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("direct: Rate limited"));
        assert!(text.contains("client: HTTP 500: boom"));
        assert!(!err.is_auth());
        assert_eq!(FallbackError { attempts: vec![] }.to_string(), "no transports configured");
    }

    #[test]
    fn test_request_builders() {
        let req = ApiRequest::patch("orders/o-1/tracking", json!({"stage": "approved"}))
            .authenticated()
            .invalidating(Tag::Orders);
        assert_eq!(req.method, Method::PATCH);
        assert!(req.auth);
        assert_eq!(req.invalidates, vec![Tag::Orders]);
        assert!(!ApiRequest::delete("orders/o-1").require_success);
    }
}
