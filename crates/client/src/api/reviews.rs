//! Review endpoints.

use std::sync::Arc;

use feedme_core::MealId;
use feedme_core::review::{MealReviews, Review, ReviewDraft};
use serde_json::Value;
use tracing::{debug, instrument};

use super::segment;
use crate::cache::{CacheKey, CacheValue, Tag};
use crate::client::ApiClient;
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::transport::ApiRequest;

impl ApiClient {
    /// Reviews of one meal, normalized.
    ///
    /// The endpoint answers either `{ reviews, averageRating, totalReviews }`
    /// or a bare review list; both come back as [`MealReviews`].
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(meal_id = %meal_id))]
    pub async fn meal_reviews(&self, meal_id: &MealId) -> Result<Arc<MealReviews>, ApiError> {
        let key = CacheKey::MealReviews(meal_id.clone());
        if let Some(CacheValue::Reviews(reviews)) = self.cache().get(&key).await {
            debug!("Cache hit");
            return Ok(reviews);
        }

        let path = format!("reviews/meal/{}", segment(meal_id.as_str()));
        let payload: Value = self.fetch(&ApiRequest::get(path)).await?.into_data()?;
        let reviews = Arc::new(match payload {
            Value::Array(_) => MealReviews::from_reviews(Envelope::new(payload).into_list()?),
            Value::Null => MealReviews::default(),
            other => serde_json::from_value(other)?,
        });
        self.cache()
            .insert(key, CacheValue::Reviews(Arc::clone(&reviews)))
            .await;
        Ok(reviews)
    }

    /// Post a review for a meal.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Invalid` for ratings outside 1..=5 or an empty
    /// comment, `ApiError::Auth` when logged out, and other `ApiError`
    /// variants if the request fails.
    #[instrument(skip(self, comment), fields(meal_id = %meal_id))]
    pub async fn submit_review(
        &self,
        meal_id: &MealId,
        rating: u8,
        comment: &str,
    ) -> Result<Review, ApiError> {
        let draft = ReviewDraft::new(meal_id.clone(), rating, comment)
            .map_err(|e| ApiError::Invalid(e.to_string()))?;
        let request = ApiRequest::post("reviews", serde_json::to_value(&draft)?)
            .authenticated()
            .invalidating(Tag::Reviews);
        self.fetch(&request).await?.into_data()
    }
}
