//! REST client for the ordering backend.
//!
//! # Architecture
//!
//! - JSON over HTTP with `reqwest`, bearer-token authenticated
//! - A 401 on an authenticated request triggers one token refresh and one
//!   replay of the original request; a failed refresh clears the session
//! - Catalog lookups are cached in memory via `moka`
//!
//! # Example
//!
//! ```rust,ignore
//! use foodcourt_client::{ApiClient, ClientConfig};
//!
//! let api = ApiClient::new(&ClientConfig::from_env()?)?;
//! api.login("mario", "Marghe!ta1").await?;
//! let products = api.products().await?;
//! ```

mod cache;
pub mod types;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use foodcourt_core::{Address, Order, OrderRequest, Product, ProductId, UserId};

use crate::config::ClientConfig;
use crate::error::ApiError;

use cache::{CacheKey, CacheValue};
use types::{
    AuthResponse, ContactRequest, ErrorBody, LoginRequest, RefreshRequest, Review, ReviewRequest,
    Session, SignupRequest, User,
};

/// Header carrying the per-cart idempotency key on order submission.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

const LOG_BODY_LIMIT: usize = 500;
const MESSAGE_LIMIT: usize = 200;

// =============================================================================
// Requests
// =============================================================================

/// A request description that can be sent again after a token refresh.
#[derive(Debug)]
struct ApiRequest {
    method: Method,
    path: String,
    body: Option<serde_json::Value>,
    idempotency_key: Option<Uuid>,
    authenticated: bool,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            idempotency_key: None,
            authenticated: true,
        }
    }

    fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    fn json(mut self, body: &impl Serialize) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Send without a bearer token and never refresh on 401.
    const fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }

    const fn idempotency_key(mut self, key: Uuid) -> Self {
        self.idempotency_key = Some(key);
        self
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the ordering REST API.
///
/// Cheap to clone; clones share the session and the catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base: Url,
    session: RwLock<Option<Session>>,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base: config.api_base(),
                session: RwLock::new(None),
                cache,
            }),
        })
    }

    /// Root URL of the API.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Current token pair, if logged in.
    pub async fn session(&self) -> Option<Session> {
        self.inner.session.read().await.clone()
    }

    /// Replace the token pair, e.g. after loading it from the local cache.
    pub async fn set_session(&self, session: Option<Session>) {
        *self.inner.session.write().await = session;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.session.read().await.is_some()
    }

    /// Exchange the refresh token for a new token pair.
    ///
    /// On failure the session is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] without a refresh token and
    /// [`ApiError::SessionExpired`] if the backend rejects it.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Session, ApiError> {
        let Some(refresh_token) = self.session().await.map(|s| s.refresh_token) else {
            self.set_session(None).await;
            return Err(ApiError::Unauthorized);
        };

        match self.request_refresh(&refresh_token).await {
            Ok(auth) => {
                let session = auth.session();
                self.set_session(Some(session.clone())).await;
                info!("Session refreshed");
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                self.set_session(None).await;
                Err(ApiError::SessionExpired)
            }
        }
    }

    async fn request_refresh(&self, refresh_token: &SecretString) -> Result<AuthResponse, ApiError> {
        let request = ApiRequest::post("auth/refresh")
            .unauthenticated()
            .json(&RefreshRequest {
                password: refresh_token.expose_secret(),
            })?;
        let response = self.send(&request).await?;
        parse(&read_body(&request.path, response).await?)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    async fn send(&self, request: &ApiRequest) -> Result<reqwest::Response, ApiError> {
        let url = self.inner.base.join(&request.path)?;
        let mut builder = self.inner.client.request(request.method.clone(), url);

        if request.authenticated
            && let Some(session) = self.inner.session.read().await.as_ref()
        {
            builder = builder.bearer_auth(session.access_token.expose_secret());
        }
        if let Some(key) = request.idempotency_key {
            builder = builder.header(IDEMPOTENCY_KEY_HEADER, key.to_string());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }

    /// Send a request, refreshing and replaying once on 401.
    async fn execute(&self, request: ApiRequest) -> Result<String, ApiError> {
        let mut response = self.send(&request).await?;

        if response.status() == StatusCode::UNAUTHORIZED && request.authenticated {
            debug!(path = %request.path, "Access token rejected, refreshing");
            self.refresh().await?;
            response = self.send(&request).await?;
        }

        read_body(&request.path, response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: impl Into<String>) -> Result<T, ApiError> {
        parse(&self.execute(ApiRequest::get(path)).await?)
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Log in and store the returned session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let request = ApiRequest::post("auth/login")
            .unauthenticated()
            .json(&LoginRequest { username, password })?;
        let auth: AuthResponse = parse(&self.execute(request).await?)?;
        self.set_session(Some(auth.session())).await;
        info!("Logged in");
        Ok(auth)
    }

    /// Create an account and store the returned session.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn signup(&self, request: &SignupRequest<'_>) -> Result<AuthResponse, ApiError> {
        let request = ApiRequest::post("auth/signup").unauthenticated().json(request)?;
        let auth: AuthResponse = parse(&self.execute(request).await?)?;
        self.set_session(Some(auth.session())).await;
        info!("Account created");
        Ok(auth)
    }

    /// Get the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session expired.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ApiError> {
        self.get_json("auth/me").await
    }

    /// Log out. The local session is cleared even if the request fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if self.is_authenticated().await
            && let Err(e) = self.execute(ApiRequest::post("auth/logout")).await
        {
            warn!(error = %e, "Logout request failed");
        }
        self.set_session(None).await;
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Arc<Vec<Product>> = Arc::new(self.get_json("products").await?);

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.get_json(format!("products/{id}")).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Reviews of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product_reviews(&self, id: ProductId) -> Result<Vec<Review>, ApiError> {
        self.get_json(format!("products/{id}/reviews")).await
    }

    /// Post a review. Drops the cached product, since its rating changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, review), fields(product_id = %id, rating = review.rating))]
    pub async fn submit_review(&self, id: ProductId, review: &ReviewRequest<'_>) -> Result<(), ApiError> {
        let request = ApiRequest::post(format!("products/{id}/reviews")).json(review)?;
        self.execute(request).await?;
        self.invalidate_product(id).await;
        Ok(())
    }

    /// Invalidate a cached product and the catalog listing.
    pub async fn invalidate_product(&self, id: ProductId) {
        self.inner.cache.invalidate(&CacheKey::Product(id)).await;
        self.inner.cache.invalidate(&CacheKey::Products).await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    // =========================================================================
    // Order Methods (not cached)
    // =========================================================================

    /// Place an order.
    ///
    /// `idempotency_key` lets the backend recognise a resubmitted cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, order), fields(lines = order.items.len(), idempotency_key = %idempotency_key))]
    pub async fn create_order(
        &self,
        order: &OrderRequest,
        idempotency_key: Uuid,
    ) -> Result<Order, ApiError> {
        let request = ApiRequest::post("orders")
            .json(order)?
            .idempotency_key(idempotency_key);
        let order: Order = parse(&self.execute(request).await?)?;
        info!(order_id = %order.id, "Order placed");
        Ok(order)
    }

    /// Orders placed by a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn user_orders(&self, user_id: UserId) -> Result<Vec<Order>, ApiError> {
        self.get_json(format!("orders/user/{user_id}")).await
    }

    /// Saved delivery addresses of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn addresses(&self) -> Result<Vec<Address>, ApiError> {
        self.get_json("user/addresses").await
    }

    // =========================================================================
    // Contact & Admin Methods
    // =========================================================================

    /// Send a contact message.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, contact), fields(subject = %contact.subject))]
    pub async fn submit_contact(&self, contact: &ContactRequest<'_>) -> Result<(), ApiError> {
        self.execute(ApiRequest::post("contacts").json(contact)?).await?;
        Ok(())
    }

    /// List all users. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Forbidden`] for non-admin sessions.
    #[instrument(skip(self))]
    pub async fn users(&self) -> Result<Vec<User>, ApiError> {
        self.get_json("users").await
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Read the body of a response, mapping non-success statuses to errors.
async fn read_body(path: &str, response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status();
    let text = response.text().await?;
    if status.is_success() {
        Ok(text)
    } else {
        Err(status_error(path, status, &text))
    }
}

fn status_error(path: &str, status: StatusCode, body: &str) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => {
            warn!(path, "Access forbidden - insufficient permissions");
            ApiError::Forbidden
        }
        StatusCode::NOT_FOUND => {
            debug!(path, "Resource not found");
            ApiError::NotFound(path.to_string())
        }
        status if status.is_server_error() => {
            tracing::error!(
                status = %status,
                path,
                body = %truncate(body, LOG_BODY_LIMIT),
                "Backend returned server error"
            );
            ApiError::Server { status }
        }
        status => ApiError::Status {
            status,
            message: error_message(body),
        },
    }
}

/// The backend's `message` field, or the start of the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| truncate(body, MESSAGE_LIMIT))
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %truncate(body, LOG_BODY_LIMIT),
            "Failed to parse backend response"
        );
        ApiError::Parse(e)
    })
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error("auth/me", StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            status_error("users", StatusCode::FORBIDDEN, ""),
            ApiError::Forbidden
        ));
        assert!(matches!(
            status_error("products/9", StatusCode::NOT_FOUND, ""),
            ApiError::NotFound(path) if path == "products/9"
        ));
        assert!(matches!(
            status_error("orders", StatusCode::BAD_GATEWAY, "upstream down"),
            ApiError::Server { status } if status == StatusCode::BAD_GATEWAY
        ));
    }

    #[test]
    fn test_error_message_prefers_backend_message() {
        let err = status_error(
            "auth/signup",
            StatusCode::BAD_REQUEST,
            r#"{"message": "Username is already taken!"}"#,
        );
        assert_eq!(
            err.to_string(),
            "Request failed (400 Bad Request): Username is already taken!"
        );
        assert_eq!(error_message("plain text"), "plain text");
        assert_eq!(error_message(&"x".repeat(300)).len(), MESSAGE_LIMIT);
    }

    #[test]
    fn test_api_base_join() {
        let config = ClientConfig::for_api_url("http://localhost:8080".parse().unwrap());
        let api = ApiClient::new(&config).unwrap();
        assert_eq!(
            api.base_url().join("orders/user/3").unwrap().as_str(),
            "http://localhost:8080/api/orders/user/3"
        );
    }

    #[test]
    fn test_request_builder_flags() {
        let key = Uuid::new_v4();
        let request = ApiRequest::post("orders").idempotency_key(key);
        assert!(request.authenticated);
        assert_eq!(request.idempotency_key, Some(key));
        assert!(!ApiRequest::post("auth/login").unauthenticated().authenticated);
    }
}
