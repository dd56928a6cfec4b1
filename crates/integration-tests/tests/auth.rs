//! Integration tests for login, session persistence, and token refresh.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use foodcourt_client::storage::{self, LocalCache, MemoryStore};
use foodcourt_client::{ApiClient, ApiError, AppState, ClientError};
use foodcourt_core::SignupForm;
use foodcourt_integration_tests::{MockBackend, PASSWORD, REFRESH_TOKEN, USER_ID, USERNAME};

async fn open(backend: &MockBackend, store: &Arc<MemoryStore>) -> AppState {
    let api = ApiClient::new(&backend.config()).unwrap();
    AppState::load(api, Arc::clone(store) as Arc<dyn LocalCache>)
        .await
        .unwrap()
}

async fn logged_in(backend: &MockBackend, store: &Arc<MemoryStore>) -> AppState {
    let mut state = open(backend, store).await;
    state.login(USERNAME, PASSWORD).await.unwrap();
    state
}

// ============================================================================
// Login & Session Restore
// ============================================================================

#[tokio::test]
async fn test_login_persists_session() {
    let backend = MockBackend::start().await;
    let store = Arc::new(MemoryStore::new());

    let state = logged_in(&backend, &store).await;
    let user = state.user().unwrap();
    assert_eq!(user.id.as_i64(), USER_ID);
    assert_eq!(user.username, USERNAME);
    assert!(state.loyalty().is_some());

    assert_eq!(
        store.get_raw(storage::REFRESH_TOKEN).unwrap().as_deref(),
        Some(format!("\"{REFRESH_TOKEN}\"").as_str())
    );

    // Login itself never carries a bearer token.
    let login = backend.requests_to("POST", "/api/auth/login");
    assert_eq!(login.len(), 1);
    assert!(login[0].authorization.is_none());
}

#[tokio::test]
async fn test_session_restored_from_store() {
    let backend = MockBackend::start().await;
    let store = Arc::new(MemoryStore::new());
    drop(logged_in(&backend, &store).await);
    backend.clear_requests();

    let state = open(&backend, &store).await;
    assert_eq!(state.user().unwrap().username, USERNAME);
    assert!(state.api().is_authenticated().await);

    state.orders().await.unwrap();
    let orders = backend.requests_to("GET", &format!("/api/orders/user/{USER_ID}"));
    assert_eq!(
        orders[0].authorization.as_deref(),
        Some(format!("Bearer {}", backend.current_access_token()).as_str())
    );
}

#[tokio::test]
async fn test_bad_credentials_do_not_refresh() {
    let backend = MockBackend::start().await;
    let store = Arc::new(MemoryStore::new());
    let mut state = open(&backend, &store).await;

    let err = state.login(USERNAME, "wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::Api(ApiError::Unauthorized)));
    assert!(state.user().is_none());
    assert!(backend.requests_to("POST", "/api/auth/refresh").is_empty());
}

#[tokio::test]
async fn test_logout_clears_credentials() {
    let backend = MockBackend::start().await;
    let store = Arc::new(MemoryStore::new());
    let mut state = logged_in(&backend, &store).await;

    state.logout().await.unwrap();
    assert!(state.user().is_none());
    assert!(!state.api().is_authenticated().await);
    assert_eq!(backend.requests_to("POST", "/api/auth/logout").len(), 1);

    let keys = store.keys();
    assert!(!keys.contains(&storage::TOKEN.to_string()));
    assert!(!keys.contains(&storage::USER.to_string()));
    // The loyalty account stays for the next login.
    assert!(keys.contains(&storage::loyalty_key(foodcourt_core::UserId::new(USER_ID))));
}

// ============================================================================
// Token Refresh
// ============================================================================

#[tokio::test]
async fn test_expired_token_refreshed_and_replayed_once() {
    let backend = MockBackend::start().await;
    let store = Arc::new(MemoryStore::new());
    let state = logged_in(&backend, &store).await;
    let old_token = backend.current_access_token();

    backend.expire_access_token();
    backend.clear_requests();
    state.orders().await.unwrap();

    let refreshes = backend.requests_to("POST", "/api/auth/refresh");
    assert_eq!(refreshes.len(), 1);
    assert!(refreshes[0].authorization.is_none());
    assert_eq!(refreshes[0].body.as_ref().unwrap()["password"], REFRESH_TOKEN);

    let orders = backend.requests_to("GET", &format!("/api/orders/user/{USER_ID}"));
    assert_eq!(orders.len(), 2);
    assert_eq!(
        orders[0].authorization.as_deref(),
        Some(format!("Bearer {old_token}").as_str())
    );
    assert_eq!(
        orders[1].authorization.as_deref(),
        Some(format!("Bearer {}", backend.current_access_token()).as_str())
    );
}

#[tokio::test]
async fn test_failed_refresh_ends_session() {
    let backend = MockBackend::start().await;
    let store = Arc::new(MemoryStore::new());
    let mut state = logged_in(&backend, &store).await;

    backend.expire_access_token();
    backend.reject_refresh();
    let err = state.orders().await.unwrap_err();
    assert!(matches!(err, ClientError::Api(ApiError::SessionExpired)));
    assert!(!state.api().is_authenticated().await);

    state.save().await.unwrap();
    assert!(state.user().is_none());
    let keys = store.keys();
    assert!(!keys.contains(&storage::TOKEN.to_string()));
    assert!(!keys.contains(&storage::REFRESH_TOKEN.to_string()));
    assert!(!keys.contains(&storage::USER.to_string()));
}

// ============================================================================
// Signup
// ============================================================================

#[tokio::test]
async fn test_signup_logs_in_new_user() {
    let backend = MockBackend::start().await;
    let store = Arc::new(MemoryStore::new());
    let mut state = open(&backend, &store).await;

    let form = SignupForm {
        username: "luigi".to_string(),
        email: " luigi@example.com ".to_string(),
        password: "Mushroom1!".to_string(),
        confirm_password: "Mushroom1!".to_string(),
    };
    let user = state.signup(&form).await.unwrap();
    assert_eq!(user.username, "luigi");

    let signup = backend.requests_to("POST", "/api/auth/signup");
    assert_eq!(signup[0].body.as_ref().unwrap()["email"], "luigi@example.com");
    // The auth response carries the user, so no profile fetch.
    assert!(backend.requests_to("GET", "/api/auth/me").is_empty());
}

#[tokio::test]
async fn test_invalid_signup_sends_nothing() {
    let backend = MockBackend::start().await;
    let store = Arc::new(MemoryStore::new());
    let mut state = open(&backend, &store).await;

    let form = SignupForm {
        username: String::new(),
        email: "not-an-email".to_string(),
        password: "short".to_string(),
        confirm_password: "other".to_string(),
    };
    let err = state.signup(&form).await.unwrap_err();
    let ClientError::InvalidForm(errors) = err else {
        panic!("expected form errors, got {err:?}");
    };
    assert!(errors.errors().len() >= 3);
    assert!(backend.requests().is_empty());
}
