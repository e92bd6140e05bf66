//! Meal catalogue endpoints.

use std::sync::Arc;

use feedme_core::meal::Meal;
use tracing::{debug, instrument};

use crate::cache::{CacheKey, CacheValue};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::transport::ApiRequest;

impl ApiClient {
    /// Every meal on offer. No session needed.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn meals(&self) -> Result<Arc<Vec<Meal>>, ApiError> {
        if let Some(CacheValue::Meals(meals)) = self.cache().get(&CacheKey::Meals).await {
            debug!("Cache hit");
            return Ok(meals);
        }

        let meals = Arc::new(
            self.fetch(&ApiRequest::get("meals"))
                .await?
                .into_list::<Meal>()?,
        );
        self.cache()
            .insert(CacheKey::Meals, CacheValue::Meals(Arc::clone(&meals)))
            .await;
        Ok(meals)
    }
}
