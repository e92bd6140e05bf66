//! Login, session persistence and authenticated reads.
//!
//! Run with: cargo test -p feedme-integration-tests --test session

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use axum::http::Method;
use feedme_client::{ApiError, FileSessionStore, SessionManager};
use feedme_core::{Email, UserRole};
use feedme_integration_tests::{PASSWORD, PROVIDER_ID, StubBackend, TOKEN, order_json};
use secrecy::SecretString;
use serde_json::json;

fn session_path(test: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("feedme-it-{}-{test}", std::process::id()))
        .join("session.json")
}

fn email() -> Email {
    Email::parse("kitchen@feedme.test").unwrap()
}

#[tokio::test]
async fn test_login_persists_and_rehydrates() {
    let backend = StubBackend::start().await;
    let path = session_path("rehydrate");
    let client = backend.client(SessionManager::new(FileSessionStore::new(&path)));

    let session = client
        .login(&email(), &SecretString::from(PASSWORD))
        .await
        .unwrap();
    assert_eq!(session.user.id.as_str(), PROVIDER_ID);
    assert_eq!(session.user.role, UserRole::Provider);
    assert_eq!(session.token.raw(), TOKEN);

    let login = backend.requests_with(&Method::POST);
    assert_eq!(
        login.first().unwrap().body,
        Some(json!({"email": "kitchen@feedme.test", "password": PASSWORD}))
    );

    // A fresh manager over the same file sees the same session
    let restored = SessionManager::rehydrate(FileSessionStore::new(&path));
    let ctx = restored.require_auth().unwrap();
    assert_eq!(ctx.user_id.as_str(), PROVIDER_ID);
    assert_eq!(ctx.role, UserRole::Provider);

    client.logout().await.unwrap();
    assert!(!client.session().is_logged_in());
    assert!(!path.exists());
    let after_logout = SessionManager::rehydrate(FileSessionStore::new(&path));
    assert!(!after_logout.is_logged_in());

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn test_wrong_password_keeps_previous_state() {
    let backend = StubBackend::start().await;
    let client = backend.anonymous_client();

    let err = client
        .login(&email(), &SecretString::from("wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Password is incorrect"));
    assert!(!client.session().is_logged_in());
}

#[tokio::test]
async fn test_login_with_verify_user_shape() {
    let backend = StubBackend::start().await;
    backend.set_login_response(json!({
        "success": true,
        "data": {
            "token": format!("Bearer {TOKEN}"),
            "verifyUser": {"_id": "admin-1", "name": "Ada", "email": "ada@feedme.test", "role": "admin"}
        }
    }));
    let client = backend.anonymous_client();

    let session = client
        .login(&email(), &SecretString::from(PASSWORD))
        .await
        .unwrap();

    assert_eq!(session.user.id.as_str(), "admin-1");
    assert_eq!(session.user.role, UserRole::Admin);
    // The prefix is stored once, not twice
    assert_eq!(session.token.header_value(), format!("Bearer {TOKEN}"));
}

#[tokio::test]
async fn test_session_notifies_subscribers() {
    let backend = StubBackend::start().await;
    let client = backend.anonymous_client();
    let mut updates = client.session().subscribe();
    assert!(updates.borrow_and_update().is_none());

    client
        .login(&email(), &SecretString::from(PASSWORD))
        .await
        .unwrap();

    assert!(updates.has_changed().unwrap());
    assert!(updates.borrow_and_update().is_some());
}

#[tokio::test]
async fn test_orders_sent_with_bearer_token() {
    let backend = StubBackend::start().await;
    backend.set_orders(vec![order_json("o-1", "2026-03-01T10:00:00Z")]);
    let client = backend.anonymous_client();

    // Logged out: the read fails before any request
    let err = client.orders().await.unwrap_err();
    assert!(err.is_auth());
    assert!(backend.requests().is_empty());

    client
        .login(&email(), &SecretString::from(PASSWORD))
        .await
        .unwrap();
    let orders = client.orders().await.unwrap();
    assert_eq!(orders.len(), 1);

    let read = backend.requests_with(&Method::GET);
    assert_eq!(
        read.first().unwrap().authorization.as_deref(),
        Some(format!("Bearer {TOKEN}").as_str())
    );
}
