//! Meal discovery over meals served by the stub backend.
//!
//! Run with: cargo test -p feedme-integration-tests --test meal_discovery

#![allow(clippy::unwrap_used)]

use axum::http::Method;
use feedme_core::discovery::{Discovery, MEALS_PER_PAGE, distinct_providers};
use feedme_integration_tests::StubBackend;
use serde_json::{Value, json};

fn meal(id: &str, name: &str, description: &str, rating_fields: &Value) -> Value {
    let mut meal = json!({
        "_id": id,
        "name": name,
        "description": description,
        "price": 11.0,
        "category": "Dinner",
        "providerId": { "_id": "p-1", "name": "Spice Route" },
    });
    if let (Some(target), Some(extra)) = (meal.as_object_mut(), rating_fields.as_object()) {
        target.extend(extra.clone());
    }
    meal
}

async fn backend_with_menu() -> StubBackend {
    let backend = StubBackend::start().await;
    backend.set_meals(vec![
        meal(
            "m-1",
            "Chicken Curry",
            "Slow-cooked and spicy",
            &json!({"ratings": {"average": 4.6, "count": 12}}),
        ),
        meal(
            "m-2",
            "Garden Salad",
            "Crisp greens with grilled CHICKEN strips",
            &json!({"rating": 4.0, "reviewCount": 3}),
        ),
        meal(
            "m-3",
            "Chicken Wrap",
            "Quick lunch",
            &json!({"rating": 3.9, "reviewCount": 8}),
        ),
        meal("m-4", "Lentil Soup", "Vegan and gluten-free", &json!({"rating": 4.8})),
        meal("m-5", "Chicken Pie", "Flaky pastry", &json!({})),
    ]);
    backend
}

#[tokio::test]
async fn test_search_chicken_with_min_rating() {
    let backend = backend_with_menu().await;
    let client = backend.anonymous_client();
    let meals = client.meals().await.unwrap();

    let mut discovery = Discovery::new();
    discovery.set_search("chicken");
    discovery.set_min_rating(4.0);
    let page = discovery.page(&meals);

    let names: Vec<&str> = page.items.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Chicken Curry", "Garden Salad"]);
    assert!(page.items.iter().all(|m| m.ratings.rating >= 4.0));
    assert_eq!(page.total, 2);
    assert_eq!(page.total_pages, 1);
}

#[tokio::test]
async fn test_rating_shapes_normalized_on_receipt() {
    let backend = backend_with_menu().await;
    let meals = backend.anonymous_client().meals().await.unwrap();

    let summary = |id: &str| {
        meals
            .iter()
            .find(|m| m.id.as_str() == id)
            .map(|m| m.ratings)
            .unwrap()
    };
    assert_eq!(summary("m-1").count, 12);
    assert!((summary("m-1").rating - 4.6).abs() < f64::EPSILON);
    assert_eq!(summary("m-2").count, 3);
    assert_eq!(summary("m-4").count, 0);
    assert!(summary("m-5").rating.abs() < f64::EPSILON);
    assert_eq!(summary("m-5").display_text(), "No reviews yet");
}

#[tokio::test]
async fn test_preference_and_provider_filters() {
    let backend = backend_with_menu().await;
    let meals = backend.anonymous_client().meals().await.unwrap();
    assert_eq!(distinct_providers(&meals), vec!["Spice Route".to_string()]);

    let mut discovery = Discovery::new();
    discovery.toggle_preference("vegan");
    let vegan: Vec<&str> = discovery
        .page(&meals)
        .items
        .iter()
        .map(|m| m.id.as_str())
        .collect();
    assert_eq!(vegan, vec!["m-4"]);

    discovery.reset();
    discovery.toggle_provider("Somebody Else");
    assert_eq!(discovery.page(&meals).total, 0);
    assert_eq!(discovery.page(&meals).total_pages, 0);
}

#[tokio::test]
async fn test_pagination_over_large_menu() {
    let backend = StubBackend::start().await;
    backend.set_meals(
        (1..=20)
            .map(|n| meal(&format!("m-{n}"), &format!("Meal {n}"), "", &json!({})))
            .collect(),
    );
    let client = backend.anonymous_client();
    let meals = client.meals().await.unwrap();

    let mut discovery = Discovery::new();
    discovery.go_to(3);
    let last = discovery.page(&meals);
    assert_eq!(last.total_pages, 3);
    assert_eq!(last.items.len(), 20 - 2 * MEALS_PER_PAGE);
    assert_eq!((last.first_index, last.last_index), (17, 20));

    // Any filter change goes back to the first page
    discovery.set_search("meal");
    assert_eq!(discovery.current_page(), 1);

    // Meals are cached after the first fetch
    client.meals().await.unwrap();
    assert_eq!(backend.requests_with(&Method::GET).len(), 1);
}
