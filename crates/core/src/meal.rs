//! Meals as served by the catalogue endpoints.

use serde::{Deserialize, Serialize};

use crate::de::null_default;
use crate::review::{RatingSummary, RawMealRatings, serialize_nested};
use crate::types::{MealId, Price, ProviderRef, UNKNOWN_PROVIDER};

/// A meal offered by a provider.
///
/// Rating data is normalized into [`RatingSummary`] on deserialization,
/// whichever shape the endpoint used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMeal", rename_all = "camelCase")]
pub struct Meal {
    /// Meal id.
    pub id: MealId,
    /// Display name.
    pub name: String,
    /// Free-text description; also searched for dietary keywords.
    pub description: String,
    /// Unit price.
    pub price: Price,
    /// Category, matched exactly by the discovery filter.
    pub category: String,
    /// Image URL.
    pub image: String,
    /// Provider behind the meal.
    pub provider: Option<ProviderRef>,
    /// Explicit dietary tags, usually absent.
    pub preferences: Vec<String>,
    /// Normalized rating aggregate.
    #[serde(serialize_with = "serialize_nested")]
    pub ratings: RatingSummary,
}

impl Meal {
    /// Provider name used for filtering and listings.
    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider
            .as_ref()
            .map_or(UNKNOWN_PROVIDER, ProviderRef::display_name)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMeal {
    #[serde(rename = "_id", alias = "id")]
    id: MealId,
    #[serde(default, deserialize_with = "null_default")]
    name: String,
    #[serde(default, deserialize_with = "null_default")]
    description: String,
    #[serde(default, deserialize_with = "null_default")]
    price: Price,
    #[serde(default, deserialize_with = "null_default")]
    category: String,
    #[serde(default, deserialize_with = "null_default")]
    image: String,
    #[serde(default, alias = "providerId")]
    provider: Option<ProviderRef>,
    #[serde(default, deserialize_with = "null_default")]
    preferences: Vec<String>,
    #[serde(flatten)]
    ratings: RawMealRatings,
}

impl From<RawMeal> for Meal {
    fn from(raw: RawMeal) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            description: raw.description,
            price: raw.price,
            category: raw.category,
            image: raw.image,
            provider: raw.provider,
            preferences: raw.preferences,
            ratings: raw.ratings.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_nested_ratings_shape() {
        let meal: Meal = serde_json::from_value(json!({
            "_id": "m-1",
            "name": "Chicken Curry",
            "price": 12.5,
            "category": "Indian",
            "providerId": {"_id": "p-1", "name": "Spice Route"},
            "ratings": {"average": 4.2, "count": 10}
        }))
        .unwrap();
        assert_eq!(meal.ratings.count, 10);
        assert!((meal.ratings.rating - 4.2).abs() < f64::EPSILON);
        assert_eq!(meal.provider_name(), "Spice Route");
        assert_eq!(meal.price.display(), "$12.50");
    }

    #[test]
    fn test_flat_ratings_and_bare_provider() {
        let meal: Meal = serde_json::from_value(json!({
            "_id": "m-2",
            "name": "Salad",
            "description": null,
            "providerId": "p-9",
            "rating": 3.5,
            "reviewCount": 2
        }))
        .unwrap();
        assert_eq!(meal.ratings.count, 2);
        assert_eq!(meal.provider_name(), "p-9");
        assert!(meal.description.is_empty());
    }

    #[test]
    fn test_missing_provider_is_unknown() {
        let meal: Meal = serde_json::from_value(json!({"_id": "m-3"})).unwrap();
        assert_eq!(meal.provider_name(), UNKNOWN_PROVIDER);
        assert!(!meal.ratings.has_reviews());
    }

    #[test]
    fn test_mistyped_rating_fields_are_defaulted() {
        let meal: Meal = serde_json::from_value(json!({
            "_id": "m-4",
            "name": "Chicken",
            "rating": "4.5",
            "reviewCount": 3.0
        }))
        .unwrap();
        assert_eq!(meal.name, "Chicken");
        assert!(meal.ratings.rating.abs() < f64::EPSILON);
        assert_eq!(meal.ratings.count, 0);

        let nested: Meal = serde_json::from_value(json!({
            "_id": "m-5",
            "ratings": {"average": "high", "count": 3.0, "reviews": [{}, {}]},
            "rating": 3.5
        }))
        .unwrap();
        assert!((nested.ratings.rating - 3.5).abs() < f64::EPSILON);
        assert_eq!(nested.ratings.count, 2);

        let scalar: Meal =
            serde_json::from_value(json!({"_id": "m-6", "ratings": 4, "rating": 4.0})).unwrap();
        assert!((scalar.ratings.rating - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serialized_meal_reads_back() {
        let meal: Meal = serde_json::from_value(json!({
            "_id": "m-7",
            "name": "Chicken Curry",
            "providerId": {"_id": "p-1", "name": "Spice Route"},
            "ratings": {"average": 4.2, "count": 10}
        }))
        .unwrap();

        let stored = serde_json::to_value(&meal).unwrap();
        assert_eq!(stored["ratings"], json!({"average": 4.2, "count": 10}));
        let back: Meal = serde_json::from_value(stored).unwrap();
        assert_eq!(back, meal);
    }
}
