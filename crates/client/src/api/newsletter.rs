//! Newsletter endpoints.

use std::sync::Arc;

use feedme_core::Email;
use feedme_core::blog::Subscriber;
use serde_json::json;
use tracing::{debug, instrument};

use crate::cache::{CacheKey, CacheValue, Tag};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::transport::ApiRequest;

impl ApiClient {
    /// Every subscriber (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` when logged out, or another `ApiError` if the
    /// request fails.
    #[instrument(skip(self))]
    pub async fn subscribers(&self) -> Result<Arc<Vec<Subscriber>>, ApiError> {
        if let Some(CacheValue::Subscribers(subs)) = self.cache().get(&CacheKey::Subscribers).await
        {
            debug!("Cache hit");
            return Ok(subs);
        }

        let request = ApiRequest::get("newsletter/all").authenticated();
        let subs = Arc::new(self.fetch(&request).await?.into_list::<Subscriber>()?);
        self.cache()
            .insert(
                CacheKey::Subscribers,
                CacheValue::Subscribers(Arc::clone(&subs)),
            )
            .await;
        Ok(subs)
    }

    /// Subscribe an address. Returns the backend's confirmation message.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, email), fields(email = %email.masked()))]
    pub async fn subscribe(&self, email: &Email) -> Result<String, ApiError> {
        self.newsletter_action("newsletter/subscribe", email, "Subscribed")
            .await
    }

    /// Unsubscribe an address. Returns the backend's confirmation message.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, email), fields(email = %email.masked()))]
    pub async fn unsubscribe(&self, email: &Email) -> Result<String, ApiError> {
        self.newsletter_action("newsletter/unsubscribe", email, "Unsubscribed")
            .await
    }

    async fn newsletter_action(
        &self,
        path: &str,
        email: &Email,
        fallback: &str,
    ) -> Result<String, ApiError> {
        let request = ApiRequest::post(path, json!({ "email": email.as_str() }))
            .invalidating(Tag::Newsletter);
        let envelope = self.fetch(&request).await?;
        Ok(envelope.message().unwrap_or_else(|| fallback.to_string()))
    }
}
