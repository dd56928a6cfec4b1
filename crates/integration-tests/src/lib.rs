//! Integration tests for the Foodcourt client.
//!
//! [`MockBackend`] serves the parts of the ordering REST API the client uses
//! on an ephemeral local port and records every request it receives, so tests
//! can assert on what actually went over the wire.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p foodcourt-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Login, session restore, token refresh
//! - `catalog` - Product cache, reviews, favorites
//! - `checkout` - Order submission and loyalty points

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use url::Url;

use foodcourt_client::ClientConfig;

pub const USER_ID: i64 = 7;
pub const USERNAME: &str = "mario";
pub const PASSWORD: &str = "Pizza4Ever!";
pub const REFRESH_TOKEN: &str = "refresh-token";

/// Product that is listed but cannot be ordered.
pub const SOLD_OUT_PRODUCT: i64 = 4;

/// A request as the backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub idempotency_key: Option<String>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    #[must_use]
    pub fn is(&self, method: &str, path: &str) -> bool {
        self.method == method && self.path == path
    }
}

// ============================================================================
// Backend State
// ============================================================================

struct Backend {
    requests: Mutex<Vec<RecordedRequest>>,
    token_generation: AtomicU32,
    refresh_rejected: AtomicBool,
    next_order_id: AtomicI64,
    addresses: Mutex<Value>,
}

impl Backend {
    fn access_token(&self) -> String {
        format!("access-{}", self.token_generation.load(Ordering::SeqCst))
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {}", self.access_token()))
    }

    fn auth_response(&self) -> Value {
        json!({
            "accessToken": self.access_token(),
            "refreshToken": REFRESH_TOKEN,
            "tokenType": "Bearer",
            "userId": USER_ID,
            "username": USERNAME,
            "email": "mario@example.com",
            "role": "USER"
        })
    }
}

fn products() -> Value {
    json!([
        {"id": 1, "name": "Margherita", "price": 8.5, "category": "PIZZA",
         "averageRating": 4.6, "createdAt": "2024-01-10T12:00:00Z"},
        {"id": 2, "name": "Cheeseburger", "price": 9.0, "category": "BURGER",
         "averageRating": 4.1, "createdAt": "2024-01-10T12:00:00Z"},
        {"id": 3, "name": "Tiramisu", "price": 5.0, "category": "DESSERT",
         "createdAt": "2024-02-01T12:00:00Z"},
        {"id": SOLD_OUT_PRODUCT, "name": "Truffle Special", "price": 19.0,
         "category": "PIZZA", "available": false}
    ])
}

fn product(id: i64) -> Option<Value> {
    products()
        .as_array()?
        .iter()
        .find(|p| p["id"].as_i64() == Some(id))
        .cloned()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Full authentication is required"})),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

async fn login(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    if body["username"] == USERNAME && body["password"] == PASSWORD {
        Json(backend.auth_response()).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid credentials"})),
        )
            .into_response()
    }
}

async fn signup(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    if body["username"] == USERNAME {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Username is already taken"})),
        )
            .into_response();
    }
    let mut auth = backend.auth_response();
    auth["username"] = body["username"].clone();
    auth["email"] = body["email"].clone();
    Json(auth).into_response()
}

async fn refresh(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    if backend.refresh_rejected.load(Ordering::SeqCst) || body["password"] != REFRESH_TOKEN {
        return unauthorized();
    }
    Json(backend.auth_response()).into_response()
}

async fn me(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "id": USER_ID,
        "username": USERNAME,
        "email": "mario@example.com",
        "role": "USER",
        "enabled": true,
        "address": "Via Roma 1"
    }))
    .into_response()
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn list_products() -> Json<Value> {
    Json(products())
}

async fn get_product(Path(id): Path<i64>) -> Response {
    match product(id) {
        Some(product) => Json(product).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Product not found"})),
        )
            .into_response(),
    }
}

async fn list_reviews(Path(_id): Path<i64>) -> Json<Value> {
    Json(json!([
        {"id": 1, "rating": 5, "comment": "Best in town", "username": "luigi"}
    ]))
}

async fn create_review(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Path(_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn create_order(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }

    let lines = body["items"].as_array().cloned().unwrap_or_default();
    let mut total_cents = 0_i64;
    let mut items = Vec::new();
    for line in &lines {
        let quantity = line["quantity"].as_i64().unwrap_or(0);
        let unit = line["unitPrice"].as_f64().unwrap_or(0.0);
        #[allow(clippy::cast_possible_truncation)]
        let unit_cents = (unit * 100.0).round() as i64;
        total_cents += unit_cents * quantity;
        if let Some(product) = line["productId"].as_i64().and_then(product) {
            items.push(json!({"product": product, "quantity": quantity, "price": line["unitPrice"]}));
        }
    }

    let id = backend.next_order_id.fetch_add(1, Ordering::SeqCst);
    #[allow(clippy::cast_precision_loss)]
    let total = total_cents as f64 / 100.0;
    (
        StatusCode::CREATED,
        Json(json!({
            "id": id,
            "totalAmount": total,
            "status": "PENDING",
            "deliveryAddress": body["deliveryAddress"],
            "deliveryNotes": body["deliveryNotes"],
            "items": items,
            "createdAt": "2024-03-01T19:30:00Z"
        })),
    )
        .into_response()
}

async fn user_orders(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Path(_user_id): Path<i64>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    Json(json!([])).into_response()
}

async fn addresses(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    let addresses = backend
        .addresses
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    Json(addresses).into_response()
}

async fn create_contact(Json(body): Json<Value>) -> Response {
    (StatusCode::CREATED, Json(json!({"id": 1, "status": "PENDING", "name": body["name"]}))).into_response()
}

/// Record the request, then pass it on with its body restored.
async fn record(State(backend): State<Arc<Backend>>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let Ok(bytes) = axum::body::to_bytes(body, usize::MAX).await else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let header_value = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };

    let recorded = RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_owned(),
        authorization: header_value(header::AUTHORIZATION.as_str()),
        idempotency_key: header_value("idempotency-key"),
        body: serde_json::from_slice(&bytes).ok(),
    };
    tracing::debug!(method = %recorded.method, path = %recorded.path, "Mock backend request");
    backend
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(recorded);

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn router(backend: Arc<Backend>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
        .route("/api/products/{id}/reviews", get(list_reviews).post(create_review))
        .route("/api/orders", post(create_order))
        .route("/api/orders/user/{user_id}", get(user_orders))
        .route("/api/user/addresses", get(addresses))
        .route("/api/contacts", post(create_contact))
        .layer(middleware::from_fn_with_state(Arc::clone(&backend), record))
        .layer(TraceLayer::new_for_http())
        .with_state(backend)
}

// ============================================================================
// MockBackend
// ============================================================================

/// A running mock backend. The server stops when this is dropped.
pub struct MockBackend {
    url: Url,
    backend: Arc<Backend>,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start a backend on an ephemeral port.
    ///
    /// The user starts with one default delivery address.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let backend = Arc::new(Backend {
            requests: Mutex::new(Vec::new()),
            token_generation: AtomicU32::new(1),
            refresh_rejected: AtomicBool::new(false),
            next_order_id: AtomicI64::new(1001),
            addresses: Mutex::new(json!([
                {"id": 1, "label": "Office", "address": "Corso Italia 8", "postalCode": "20122"},
                {"id": 2, "label": "Home", "address": "Via Roma 1", "postalCode": "00184", "isDefault": true}
            ])),
        });

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener
            .local_addr()
            .expect("Failed to read mock backend address");
        let app = router(Arc::clone(&backend));
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        let url = Url::parse(&format!("http://{addr}")).expect("Invalid mock backend URL");
        Self {
            url,
            backend,
            server,
        }
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::for_api_url(self.url.clone())
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.backend
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests matching `method` and `path`.
    #[must_use]
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.is(method, path))
            .collect()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.backend
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Invalidate the current access token; the refresh token stays valid.
    pub fn expire_access_token(&self) {
        self.backend.token_generation.fetch_add(1, Ordering::SeqCst);
    }

    /// The access token the backend currently accepts.
    #[must_use]
    pub fn current_access_token(&self) -> String {
        self.backend.access_token()
    }

    /// Make every refresh attempt fail.
    pub fn reject_refresh(&self) {
        self.backend.refresh_rejected.store(true, Ordering::SeqCst);
    }

    /// Replace the saved delivery addresses.
    pub fn set_addresses(&self, addresses: Value) {
        *self
            .backend
            .addresses
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = addresses;
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}
