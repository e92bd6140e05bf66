//! Order tracking workflow against the stub backend.
//!
//! Run with: cargo test -p feedme-integration-tests --test order_tracking

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::Method;
use chrono::Utc;
use feedme_client::{
    ApiClient, AuthError, NotificationKind, RecordingNotifier, TrackingWorkflow, Transport,
    WorkflowError,
};
use feedme_core::order::Order;
use feedme_core::{OrderId, OrderStage, ProviderId};
use feedme_integration_tests::{
    Faults, PROVIDER_ID, Route, StubBackend, TOKEN, order_json,
};
use serde_json::json;

async fn backend_with_orders() -> StubBackend {
    let backend = StubBackend::start().await;
    backend.set_orders(vec![
        order_json("o-1", "2026-03-01T10:00:00Z"),
        order_json("o-2", "2026-03-02T10:00:00Z"),
    ]);
    backend
}

fn workflow(client: &ApiClient) -> (TrackingWorkflow, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    (
        TrackingWorkflow::new(client.clone(), notifier.clone()),
        notifier,
    )
}

async fn fetch_order(client: &ApiClient, id: &str) -> Order {
    client
        .provider_orders(&ProviderId::new(PROVIDER_ID))
        .await
        .unwrap()
        .iter()
        .find(|o| o.id.as_str() == id)
        .cloned()
        .unwrap()
}

// ============================================================================
// Stage updates
// ============================================================================

#[tokio::test]
async fn test_update_stage_without_session_sends_nothing() {
    let backend = backend_with_orders().await;
    let client = backend.anonymous_client();
    let (workflow, notifier) = workflow(&client);
    let mut order = Order::new("o-1", "placed");

    let err = workflow
        .update_stage(&mut order, OrderStage::Delivered, "Arrived")
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Auth(AuthError::NotLoggedIn)));
    assert!(backend.requests().is_empty());
    assert!(order.tracking_updates.is_empty());
    assert_eq!(order.status, "placed");

    let notifications = notifier.notifications();
    assert_eq!(notifications.len(), 1);
    let only = notifications.first().unwrap();
    assert_eq!(only.kind, NotificationKind::Error);
    assert_eq!(only.title, "Authentication Required");
}

#[tokio::test]
async fn test_provider_marks_order_delivered() {
    let backend = backend_with_orders().await;
    let client = backend.provider_client();
    let (workflow, notifier) = workflow(&client);
    let mut order = fetch_order(&client, "o-1").await;

    let before = Utc::now();
    let change = workflow
        .update_stage(&mut order, OrderStage::Delivered, "Arrived")
        .await
        .unwrap();
    let after = Utc::now();

    // Exactly one new update, stamped now
    assert_eq!(order.tracking_updates.len(), 1);
    let update = order.tracking_updates.last().unwrap();
    assert_eq!(update.stage, OrderStage::Delivered);
    assert_eq!(update.message, "Arrived");
    assert!(update.timestamp >= before && update.timestamp <= after);
    assert_eq!(order.current_stage().stage(), Some(OrderStage::Delivered));

    // Direct transport went first and succeeded
    assert_eq!(change.transport, Transport::Direct);
    let patches = backend.requests_with(&Method::PATCH);
    assert_eq!(patches.len(), 1);
    let patch = patches.first().unwrap();
    assert_eq!(patch.route, Route::Direct);
    assert_eq!(patch.path, "/orders/o-1/tracking");
    assert_eq!(patch.authorization.as_deref(), Some(format!("Bearer {TOKEN}").as_str()));
    assert_eq!(
        patch.body,
        Some(json!({"stage": "delivered", "message": "Arrived"}))
    );

    // The refetch reflects the backend's copy
    let refreshed = change.refreshed.unwrap();
    let stored = refreshed.iter().find(|o| o.id.as_str() == "o-1").unwrap();
    assert_eq!(stored.current_stage().stage(), Some(OrderStage::Delivered));

    let successes = notifier.of_kind(NotificationKind::Success);
    assert_eq!(successes.len(), 1);
    assert_eq!(
        successes.first().unwrap().message,
        "Order status updated to Delivered"
    );
}

#[tokio::test]
async fn test_update_stage_default_message() {
    let backend = backend_with_orders().await;
    let client = backend.provider_client();
    let (workflow, _) = workflow(&client);
    let mut order = fetch_order(&client, "o-2").await;

    let change = workflow
        .update_stage(&mut order, OrderStage::Approved, "  ")
        .await
        .unwrap();

    assert_eq!(change.update.message, "Order approved successfully");
}

#[tokio::test]
async fn test_update_stage_falls_back_to_client_transport() {
    let backend = backend_with_orders().await;
    backend.set_faults(Faults {
        fail_tracking: vec![Route::Direct],
        ..Faults::default()
    });
    let client = backend.provider_client();
    let (workflow, notifier) = workflow(&client);
    let mut order = fetch_order(&client, "o-1").await;

    let change = workflow
        .update_stage(&mut order, OrderStage::Processed, "In the oven")
        .await
        .unwrap();

    assert_eq!(change.transport, Transport::Client);
    let routes: Vec<Route> = backend
        .requests_with(&Method::PATCH)
        .iter()
        .map(|r| r.route)
        .collect();
    assert_eq!(routes, vec![Route::Direct, Route::Client]);
    assert_eq!(order.current_stage().stage(), Some(OrderStage::Processed));
    assert!(notifier.of_kind(NotificationKind::Error).is_empty());
}

#[tokio::test]
async fn test_update_stage_both_transports_fail() {
    let backend = backend_with_orders().await;
    backend.set_faults(Faults {
        fail_tracking: vec![Route::Direct, Route::Client],
        ..Faults::default()
    });
    let client = backend.provider_client();
    let (workflow, notifier) = workflow(&client);
    let mut order = fetch_order(&client, "o-1").await;
    let original = order.clone();

    let err = workflow
        .update_stage(&mut order, OrderStage::Approved, "")
        .await
        .unwrap_err();

    let WorkflowError::Exhausted(exhausted) = err else {
        panic!("expected exhausted transports, got {err:?}");
    };
    assert_eq!(exhausted.attempts.len(), 2);
    assert_eq!(order, original);

    let errors = notifier.of_kind(NotificationKind::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().unwrap().title, "Update Failed");
    assert!(errors.first().unwrap().message.starts_with("Update failed: "));
}

#[tokio::test]
async fn test_backward_stage_change_is_allowed() {
    let backend = backend_with_orders().await;
    let client = backend.provider_client();
    let (workflow, _) = workflow(&client);
    let mut order = fetch_order(&client, "o-1").await;

    workflow
        .update_stage(&mut order, OrderStage::Delivered, "Arrived")
        .await
        .unwrap();
    workflow
        .update_stage(&mut order, OrderStage::Placed, "Reopened")
        .await
        .unwrap();

    assert_eq!(order.tracking_updates.len(), 2);
    assert_eq!(order.current_stage().stage(), Some(OrderStage::Placed));
}

// ============================================================================
// Deletion
// ============================================================================

#[tokio::test]
async fn test_delete_order_refetches_without_it() {
    let backend = backend_with_orders().await;
    let client = backend.provider_client();
    let (workflow, notifier) = workflow(&client);

    // Warm the cache so the refetch has something to invalidate
    fetch_order(&client, "o-1").await;

    let outcome = workflow.delete_order(&OrderId::new("o-1")).await.unwrap();

    assert_eq!(outcome.transport, Transport::Client);
    assert!(!outcome.already_gone);
    let refreshed = outcome.refreshed.unwrap();
    assert_eq!(refreshed.len(), 1);
    assert!(refreshed.iter().all(|o| o.id.as_str() != "o-1"));
    assert_eq!(backend.orders().len(), 1);

    let successes = notifier.of_kind(NotificationKind::Success);
    assert_eq!(successes.len(), 1);
    assert_eq!(successes.first().unwrap().title, "Order Deleted");
}

#[tokio::test]
async fn test_delete_missing_order_is_success() {
    let backend = backend_with_orders().await;
    let client = backend.provider_client();
    let (workflow, notifier) = workflow(&client);

    let outcome = workflow
        .delete_order(&OrderId::new("already-gone"))
        .await
        .unwrap();

    assert!(outcome.already_gone);
    assert_eq!(outcome.transport, Transport::Client);
    // Not found on the first transport ends the chain
    assert_eq!(backend.requests_with(&Method::DELETE).len(), 1);
    assert!(notifier.of_kind(NotificationKind::Error).is_empty());
}

#[tokio::test]
async fn test_delete_not_found_on_direct_after_client_failure() {
    let backend = backend_with_orders().await;
    backend.set_faults(Faults {
        fail_delete: vec![Route::Client],
        ..Faults::default()
    });
    let client = backend.provider_client();
    let (workflow, notifier) = workflow(&client);

    let outcome = workflow
        .delete_order(&OrderId::new("already-gone"))
        .await
        .unwrap();

    assert!(outcome.already_gone);
    assert_eq!(outcome.transport, Transport::Direct);
    let routes: Vec<Route> = backend
        .requests_with(&Method::DELETE)
        .iter()
        .map(|r| r.route)
        .collect();
    assert_eq!(routes, vec![Route::Client, Route::Direct]);
    assert!(notifier.of_kind(NotificationKind::Error).is_empty());
}

#[tokio::test]
async fn test_delete_refused_everywhere_keeps_order() {
    let backend = backend_with_orders().await;
    backend.set_faults(Faults {
        refuse_delete: vec![Route::Client, Route::Direct],
        ..Faults::default()
    });
    let client = backend.provider_client();
    let (workflow, notifier) = workflow(&client);

    let err = workflow
        .delete_order(&OrderId::new("o-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Exhausted(_)));
    assert_eq!(backend.orders().len(), 2);
    let errors = notifier.of_kind(NotificationKind::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().unwrap().title, "Delete Failed");
}

#[tokio::test]
async fn test_delete_without_session_sends_nothing() {
    let backend = backend_with_orders().await;
    let client = backend.anonymous_client();
    let (workflow, _) = workflow(&client);

    let err = workflow
        .delete_order(&OrderId::new("o-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Auth(_)));
    assert!(backend.requests().is_empty());
    assert_eq!(backend.orders().len(), 2);
}
