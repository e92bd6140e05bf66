//! Reviews and rating normalization.
//!
//! Meal records carry review data in whichever shape the serving endpoint
//! happens to use:
//!
//! ```json
//! { "ratings": { "average": 4.2, "count": 10, "reviews": [...] } }
//! { "rating": 3.5, "reviewCount": 2 }
//! {}
//! ```
//!
//! [`RawMealRatings`] accepts all of them and [`RatingSummary`] is the single
//! canonical form the rest of the code sees. Conversion happens once, when a
//! meal is deserialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::de::{lenient_datetime, lenient_option, lenient_vec, null_default};
use crate::types::{MealId, Reference, ReviewId};

// =============================================================================
// Rating summary
// =============================================================================

/// Canonical rating aggregate of a meal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Average rating, 0 when unknown.
    pub rating: f64,
    /// Number of reviews, 0 when unknown.
    pub count: u32,
}

impl RatingSummary {
    /// Whether the meal has at least one review.
    #[must_use]
    pub const fn has_reviews(&self) -> bool {
        self.count > 0
    }

    /// Short text for listings, e.g. `"4.2 · 10 reviews"`.
    #[must_use]
    pub fn display_text(&self) -> String {
        match self.count {
            0 => "No reviews yet".to_string(),
            1 => format!("{:.1} · 1 review", self.rating),
            n => format!("{:.1} · {n} reviews", self.rating),
        }
    }
}

/// Nested `ratings` object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NestedRatings {
    /// Average rating.
    #[serde(default, deserialize_with = "lenient_option")]
    pub average: Option<f64>,
    /// Review count.
    #[serde(default, deserialize_with = "lenient_option")]
    pub count: Option<u32>,
    /// Embedded reviews; only the length matters here.
    #[serde(default, deserialize_with = "lenient_option")]
    pub reviews: Option<Vec<Value>>,
}

/// Every rating field a meal payload may carry.
///
/// Fields with the wrong JSON type count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMealRatings {
    /// Nested form.
    #[serde(default, deserialize_with = "lenient_option")]
    pub ratings: Option<NestedRatings>,
    /// Flat average.
    #[serde(default, deserialize_with = "lenient_option")]
    pub rating: Option<f64>,
    /// Flat count.
    #[serde(default, deserialize_with = "lenient_option")]
    pub review_count: Option<u32>,
}

impl RawMealRatings {
    /// Read the rating fields out of an untyped payload.
    ///
    /// Fields with the wrong JSON type count as absent.
    #[must_use]
    pub fn from_value(meal: &Value) -> Self {
        let nested = meal.get("ratings").filter(|v| v.is_object());
        let as_count = |v: &Value| v.as_u64().and_then(|n| u32::try_from(n).ok());
        Self {
            ratings: nested.map(|r| NestedRatings {
                average: r.get("average").and_then(Value::as_f64),
                count: r.get("count").and_then(as_count),
                reviews: r.get("reviews").and_then(Value::as_array).cloned(),
            }),
            rating: meal.get("rating").and_then(Value::as_f64),
            review_count: meal.get("reviewCount").and_then(as_count),
        }
    }

    /// Nested average, then flat rating, then 0.
    #[must_use]
    pub fn rating(&self) -> f64 {
        self.ratings
            .as_ref()
            .and_then(|r| r.average)
            .or(self.rating)
            .unwrap_or(0.0)
    }

    /// Nested count, then flat count, then embedded review list length, then 0.
    #[must_use]
    pub fn count(&self) -> u32 {
        let nested = self.ratings.as_ref();
        nested
            .and_then(|r| r.count)
            .or(self.review_count)
            .or_else(|| {
                nested
                    .and_then(|r| r.reviews.as_ref())
                    .map(|reviews| u32::try_from(reviews.len()).unwrap_or(u32::MAX))
            })
            .unwrap_or(0)
    }
}

/// Write a summary in the nested `{average, count}` shape that
/// [`RawMealRatings`] reads back.
pub(crate) fn serialize_nested<S>(summary: &RatingSummary, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    #[derive(Serialize)]
    struct Nested {
        average: f64,
        count: u32,
    }

    Nested {
        average: summary.rating,
        count: summary.count,
    }
    .serialize(serializer)
}

impl From<RawMealRatings> for RatingSummary {
    fn from(raw: RawMealRatings) -> Self {
        Self {
            rating: raw.rating(),
            count: raw.count(),
        }
    }
}

/// Rating of an untyped meal payload.
#[must_use]
pub fn meal_rating(meal: &Value) -> f64 {
    RawMealRatings::from_value(meal).rating()
}

/// Review count of an untyped meal payload.
#[must_use]
pub fn review_count(meal: &Value) -> u32 {
    RawMealRatings::from_value(meal).count()
}

// =============================================================================
// Reviews
// =============================================================================

/// A single customer review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawReview")]
pub struct Review {
    /// Review id.
    pub id: ReviewId,
    /// Star rating.
    pub rating: f64,
    /// Free-text comment.
    pub comment: String,
    /// Author, when the backend populated it.
    pub user: Option<Reference>,
    /// Creation time; replaced with the fetch time when missing or invalid.
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReview {
    #[serde(rename = "_id", alias = "id", default)]
    id: ReviewId,
    #[serde(default, deserialize_with = "null_default")]
    rating: f64,
    #[serde(default, deserialize_with = "null_default")]
    comment: String,
    #[serde(default)]
    user: Option<Reference>,
    #[serde(default)]
    user_id: Option<Reference>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    created_at: Option<DateTime<Utc>>,
}

impl From<RawReview> for Review {
    fn from(raw: RawReview) -> Self {
        // `userId` only stands in for `user` when it was populated.
        let populated_user_id = raw
            .user_id
            .filter(|r| matches!(r, Reference::Populated { .. }));
        Self {
            id: raw.id,
            rating: raw.rating,
            comment: raw.comment,
            user: raw.user.or(populated_user_id),
            created_at: raw.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Reviews of one meal with their aggregate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealReviews {
    /// Individual reviews.
    #[serde(default, deserialize_with = "lenient_vec")]
    pub reviews: Vec<Review>,
    /// Average rating.
    #[serde(default, deserialize_with = "null_default")]
    pub average_rating: f64,
    /// Total number of reviews.
    #[serde(default, deserialize_with = "null_default")]
    pub total_reviews: u32,
}

impl MealReviews {
    /// Aggregate a bare review list.
    #[must_use]
    pub fn from_reviews(reviews: Vec<Review>) -> Self {
        let total_reviews = u32::try_from(reviews.len()).unwrap_or(u32::MAX);
        let average_rating = if reviews.is_empty() {
            0.0
        } else {
            reviews.iter().map(|r| r.rating).sum::<f64>() / f64::from(total_reviews)
        };
        Self {
            reviews,
            average_rating,
            total_reviews,
        }
    }
}

/// Errors building a review submission.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    /// Rating outside 1..=5.
    #[error("rating must be between 1 and 5 (got {0})")]
    RatingOutOfRange(u8),
    /// Comment is blank.
    #[error("review comment cannot be empty")]
    EmptyComment,
}

/// Payload for `POST /reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    meal_id: MealId,
    rating: u8,
    comment: String,
}

impl ReviewDraft {
    /// Validate and build a review submission.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError`] for ratings outside 1..=5 or blank comments.
    pub fn new(meal_id: MealId, rating: u8, comment: &str) -> Result<Self, ReviewError> {
        if !(1..=5).contains(&rating) {
            return Err(ReviewError::RatingOutOfRange(rating));
        }
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ReviewError::EmptyComment);
        }
        Ok(Self {
            meal_id,
            rating,
            comment: comment.to_owned(),
        })
    }

    /// The reviewed meal.
    #[must_use]
    pub const fn meal_id(&self) -> &MealId {
        &self.meal_id
    }
}
