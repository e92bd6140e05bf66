//! Integration tests for feedme.
//!
//! The tests run the real client against [`StubBackend`], an in-process
//! axum server that speaks the backend's JSON envelope. The same routes are
//! mounted twice, under `/api` for the client transport and under `/direct`
//! for the direct transport, so tests can tell which transport carried a
//! request and inject faults per transport.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p feedme-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, header::AUTHORIZATION};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use feedme_client::{ApiClient, ClientConfig, MemorySessionStore, SessionManager};
use feedme_core::{BearerToken, Session, User, UserRole};
use serde_json::{Value, json};

/// Token the stub hands out and accepts.
pub const TOKEN: &str = "stub-token";
/// The only password the stub accepts.
pub const PASSWORD: &str = "secret";
/// Provider id of the stub's logged-in provider.
pub const PROVIDER_ID: &str = "provider-1";

/// Which mount point served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `/api`, reached through the client transport.
    Client,
    /// `/direct`, reached through the direct transport.
    Direct,
}

/// A request as the stub saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub route: Route,
    pub method: Method,
    /// Path below the mount point, e.g. `/orders/o-1/tracking`.
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

/// Injected failures, per route.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Tracking PATCHes answered with 500.
    pub fail_tracking: Vec<Route>,
    /// DELETEs answered with 500.
    pub fail_delete: Vec<Route>,
    /// DELETEs answered with `200 {"success": false}`.
    pub refuse_delete: Vec<Route>,
}

#[derive(Default)]
struct Store {
    orders: Vec<Value>,
    meals: Vec<Value>,
    requests: Vec<RecordedRequest>,
    faults: Faults,
    login_response: Option<Value>,
}

#[derive(Clone)]
struct RouteState {
    store: Arc<Mutex<Store>>,
    route: Route,
}

impl RouteState {
    fn store(&self) -> MutexGuard<'_, Store> {
        lock(&self.store)
    }

    fn record(&self, method: Method, path: String, headers: &HeaderMap, body: Option<Value>) {
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        self.store().requests.push(RecordedRequest {
            route: self.route,
            method,
            path,
            authorization,
            body,
        });
    }
}

fn lock(store: &Mutex<Store>) -> MutexGuard<'_, Store> {
    store.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

type Reply = (StatusCode, Json<Value>);

fn ok(message: &str, data: Value) -> Reply {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": message, "data": data })),
    )
}

fn fail(status: StatusCode, message: &str) -> Reply {
    (
        status,
        Json(json!({ "success": false, "message": message, "errorSources": [] })),
    )
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn provider_of(order: &Value) -> Option<&str> {
    let provider = order.get("provider").or_else(|| order.get("providerId"))?;
    provider
        .as_str()
        .or_else(|| provider.get("_id").and_then(Value::as_str))
}

// ============================================================================
// Handlers
// ============================================================================

async fn login(
    State(state): State<RouteState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    state.record(Method::POST, "/auth/login".into(), &headers, Some(body.clone()));

    if body.get("password").and_then(Value::as_str) != Some(PASSWORD) {
        return fail(StatusCode::UNAUTHORIZED, "Password is incorrect");
    }
    if let Some(custom) = state.store().login_response.clone() {
        return (StatusCode::OK, Json(custom));
    }
    let email = body.get("email").cloned().unwrap_or(Value::Null);
    ok(
        "User logged in successfully",
        json!({
            "accessToken": TOKEN,
            "user": { "_id": PROVIDER_ID, "name": "Stub Kitchen", "email": email, "role": "provider" }
        }),
    )
}

async fn list_orders(State(state): State<RouteState>, headers: HeaderMap) -> Reply {
    state.record(Method::GET, "/orders".into(), &headers, None);
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "You are not authorized");
    }
    let orders = state.store().orders.clone();
    ok("Orders retrieved successfully", Value::Array(orders))
}

async fn provider_orders(
    State(state): State<RouteState>,
    Path(provider_id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    state.record(
        Method::GET,
        format!("/orders/provider/{provider_id}"),
        &headers,
        None,
    );
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "You are not authorized");
    }
    let orders: Vec<Value> = state
        .store()
        .orders
        .iter()
        .filter(|o| provider_of(o) == Some(provider_id.as_str()))
        .cloned()
        .collect();
    ok("Orders retrieved successfully", Value::Array(orders))
}

async fn update_tracking(
    State(state): State<RouteState>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    state.record(
        Method::PATCH,
        format!("/orders/{order_id}/tracking"),
        &headers,
        Some(body.clone()),
    );
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "You are not authorized");
    }

    let mut store = state.store();
    if store.faults.fail_tracking.contains(&state.route) {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Tracking service unavailable");
    }
    let Some(order) = store
        .orders
        .iter_mut()
        .find(|o| o.get("_id").and_then(Value::as_str) == Some(order_id.as_str()))
    else {
        return fail(StatusCode::NOT_FOUND, "Order not found");
    };

    let stage = body.get("stage").cloned().unwrap_or(Value::Null);
    let update = json!({
        "stage": stage.clone(),
        "message": body.get("message").cloned().unwrap_or(Value::Null),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    order["status"] = stage;
    if !order.get("trackingUpdates").is_some_and(Value::is_array) {
        order["trackingUpdates"] = json!([]);
    }
    if let Some(updates) = order["trackingUpdates"].as_array_mut() {
        updates.push(update);
    }
    ok("Tracking updated successfully", order.clone())
}

async fn delete_order(
    State(state): State<RouteState>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    state.record(Method::DELETE, format!("/orders/{order_id}"), &headers, None);
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "You are not authorized");
    }

    let mut store = state.store();
    if store.faults.fail_delete.contains(&state.route) {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Delete failed");
    }
    if store.faults.refuse_delete.contains(&state.route) {
        return (
            StatusCode::OK,
            Json(json!({ "success": false, "message": "Order is locked" })),
        );
    }
    let before = store.orders.len();
    store
        .orders
        .retain(|o| o.get("_id").and_then(Value::as_str) != Some(order_id.as_str()));
    if store.orders.len() == before {
        return fail(StatusCode::NOT_FOUND, "Order not found");
    }
    ok("Order deleted successfully", Value::Null)
}

async fn list_meals(State(state): State<RouteState>, headers: HeaderMap) -> Reply {
    state.record(Method::GET, "/meals".into(), &headers, None);
    let meals = state.store().meals.clone();
    ok("Meals retrieved successfully", Value::Array(meals))
}

fn routes() -> Router<RouteState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/orders", get(list_orders))
        .route("/orders/provider/{id}", get(provider_orders))
        .route("/orders/{id}/tracking", patch(update_tracking))
        .route("/orders/{id}", delete(delete_order))
        .route("/meals", get(list_meals))
}

// ============================================================================
// Stub backend
// ============================================================================

/// In-process backend for one test.
#[derive(Clone)]
pub struct StubBackend {
    addr: SocketAddr,
    store: Arc<Mutex<Store>>,
}

impl StubBackend {
    /// Bind to an ephemeral port and serve in the background.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let store = Arc::new(Mutex::new(Store::default()));
        let mounted = |route| {
            routes().with_state(RouteState {
                store: Arc::clone(&store),
                route,
            })
        };
        let app = Router::new()
            .nest("/api", mounted(Route::Client))
            .nest("/direct", mounted(Route::Direct));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub backend");
        let addr = listener.local_addr().expect("Stub backend has no address");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Stub backend stopped");
        });

        Self { addr, store }
    }

    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    #[must_use]
    pub fn direct_url(&self) -> String {
        format!("http://{}/direct", self.addr)
    }

    /// Client configuration pointing both transports at this stub.
    ///
    /// # Panics
    ///
    /// Panics if the stub URLs do not parse.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::for_base_url(&self.api_url()).expect("Invalid stub URL");
        config.direct_api_url = ClientConfig::for_base_url(&self.direct_url())
            .expect("Invalid stub URL")
            .api_url;
        config
    }

    /// Client over `session`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client(&self, session: SessionManager) -> ApiClient {
        ApiClient::new(self.config(), session).expect("Failed to build client")
    }

    /// Client with no session.
    #[must_use]
    pub fn anonymous_client(&self) -> ApiClient {
        self.client(SessionManager::new(MemorySessionStore::new()))
    }

    /// Client logged in as the stub provider.
    #[must_use]
    pub fn provider_client(&self) -> ApiClient {
        self.client(SessionManager::new(MemorySessionStore::with_session(
            provider_session(),
        )))
    }

    pub fn set_orders(&self, orders: Vec<Value>) {
        lock(&self.store).orders = orders;
    }

    pub fn set_meals(&self, meals: Vec<Value>) {
        lock(&self.store).meals = meals;
    }

    pub fn set_faults(&self, faults: Faults) {
        lock(&self.store).faults = faults;
    }

    /// Answer successful logins with `body` instead of the default shape.
    pub fn set_login_response(&self, body: Value) {
        lock(&self.store).login_response = Some(body);
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        lock(&self.store).orders.clone()
    }

    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.store).requests.clone()
    }

    /// Requests with `method`, in arrival order.
    #[must_use]
    pub fn requests_with(&self, method: &Method) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| &r.method == method)
            .collect()
    }
}

/// Session of the stub provider.
#[must_use]
pub fn provider_session() -> Session {
    let mut user = User::new(PROVIDER_ID, "kitchen@feedme.test", UserRole::Provider);
    user.name = "Stub Kitchen".into();
    Session::new(user, BearerToken::new(TOKEN))
}

/// A placed order of the stub provider.
#[must_use]
pub fn order_json(id: &str, created_at: &str) -> Value {
    json!({
        "_id": id,
        "name": "Jane Doe",
        "email": "jane@feedme.test",
        "provider": PROVIDER_ID,
        "items": [{ "meal": { "_id": "meal-1", "name": "Chicken Bowl" }, "price": 12.5, "quantity": 2 }],
        "totalPrice": 25.0,
        "status": "placed",
        "trackingUpdates": [],
        "createdAt": created_at,
    })
}
