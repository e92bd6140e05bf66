//! The REST client shared by every resource API and workflow.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::cache::QueryCache;
use crate::config::ClientConfig;
use crate::envelope::Envelope;
use crate::error::{ApiError, error_message};
use crate::session::SessionManager;
use crate::transport::{ApiRequest, Transport};

/// Client for the feedme REST backend.
///
/// Cheap to clone; clones share the HTTP connection pool, the session
/// manager and the query cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    session: SessionManager,
    cache: QueryCache,
}

impl ApiClient {
    /// Create a client over an existing session manager.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, session: SessionManager) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        let cache = QueryCache::new(config.cache_capacity, config.cache_ttl);

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                config,
                session,
                cache,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    /// Send `request` over `transport` and return the decoded body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` when the request needs a session and there is
    /// none (nothing is sent), and the matching `ApiError` variant for HTTP,
    /// status and envelope failures.
    #[instrument(
        skip(self, request),
        fields(%transport, method = %request.method, path = %request.path)
    )]
    pub async fn send(&self, transport: Transport, request: &ApiRequest) -> Result<Value, ApiError> {
        let token = if request.auth {
            Some(self.inner.session.require_auth()?.token)
        } else {
            self.inner
                .session
                .current()
                .map(|s| s.token)
                .filter(|t| !t.is_empty())
        };

        let base = match transport {
            Transport::Client => &self.inner.config.api_url,
            Transport::Direct => &self.inner.config.direct_api_url,
        };
        let url = base.join(request.path.trim_start_matches('/'))?;

        let mut builder = self.inner.http.request(request.method.clone(), url);
        if transport == Transport::Direct {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .header(ACCEPT, "application/json");
        }
        if let Some(token) = &token {
            builder = builder.header(AUTHORIZATION, token.header_value());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let envelope = Envelope::new(read_response(response).await?);
        if request.require_success {
            envelope.require_success()?;
        } else {
            envelope.check()?;
        }

        if transport == Transport::Client {
            for &tag in &request.invalidates {
                self.inner.cache.invalidate_tag(tag).await;
            }
        }
        Ok(envelope.into_body())
    }

    /// Send over the client transport and wrap the body in an [`Envelope`].
    pub(crate) async fn fetch(&self, request: &ApiRequest) -> Result<Envelope, ApiError> {
        self.send(Transport::Client, request).await.map(Envelope::new)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_url", &self.inner.config.api_url.as_str())
            .field("direct_api_url", &self.inner.config.direct_api_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

/// Map the status and decode the body. Empty bodies decode to `null`.
async fn read_response(response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status();

    // Check for rate limiting
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(ApiError::RateLimited(retry_after));
    }

    let text = response.text().await?;

    if !status.is_success() {
        let message = error_message(&text);
        debug!(status = %status, %message, "Backend returned non-success status");
        return Err(match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
            _ => ApiError::Status {
                status: status.as_u16(),
                message,
            },
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| {
        error!(
            error = %e,
            body = %text.chars().take(500).collect::<String>(),
            "Failed to parse backend response"
        );
        ApiError::Parse(e)
    })
}
