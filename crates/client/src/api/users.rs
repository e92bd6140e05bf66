//! User endpoints.

use std::sync::Arc;

use feedme_core::user::User;
use tracing::{debug, instrument};

use crate::cache::{CacheKey, CacheValue};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::transport::ApiRequest;

impl ApiClient {
    /// Every account (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` when logged out, or another `ApiError` if the
    /// request fails.
    #[instrument(skip(self))]
    pub async fn users(&self) -> Result<Arc<Vec<User>>, ApiError> {
        if let Some(CacheValue::Users(users)) = self.cache().get(&CacheKey::Users).await {
            debug!("Cache hit");
            return Ok(users);
        }

        let request = ApiRequest::get("users").authenticated();
        let users = Arc::new(self.fetch(&request).await?.into_list::<User>()?);
        self.cache()
            .insert(CacheKey::Users, CacheValue::Users(Arc::clone(&users)))
            .await;
        Ok(users)
    }
}
