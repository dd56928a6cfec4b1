//! Integration tests for order submission and loyalty points.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use foodcourt_client::checkout;
use foodcourt_client::storage::{LocalCache, MemoryStore};
use foodcourt_client::{ApiClient, AppState, ClientError};
use foodcourt_core::{
    AddressId, CartError, Customization, ProductId, Size, ValidationError,
};
use foodcourt_integration_tests::{MockBackend, PASSWORD, SOLD_OUT_PRODUCT, USERNAME};

async fn logged_in(backend: &MockBackend) -> AppState {
    let api = ApiClient::new(&backend.config()).unwrap();
    let store: Arc<dyn LocalCache> = Arc::new(MemoryStore::new());
    let mut state = AppState::load(api, store).await.unwrap();
    state.login(USERNAME, PASSWORD).await.unwrap();
    state
}

async fn large_margherita(state: &AppState) -> Customization {
    let product = state.api().product(ProductId::new(1)).await.unwrap();
    Customization::for_product(&product).with_size(Size::Large)
}

#[tokio::test]
async fn test_checkout_submits_cart_snapshot() {
    let backend = MockBackend::start().await;
    let mut state = logged_in(&backend).await;

    let customization = large_margherita(&state).await;
    state
        .add_to_cart(ProductId::new(1), Some(customization))
        .await
        .unwrap();
    state.add_to_cart(ProductId::new(3), None).await.unwrap();
    state.add_to_cart(ProductId::new(3), None).await.unwrap();

    let receipt = state.checkout(None, "Ring twice").await.unwrap();

    let orders = backend.requests_to("POST", "/api/orders");
    assert_eq!(orders.len(), 1);
    let body = orders[0].body.as_ref().unwrap();
    assert_eq!(body["deliveryAddress"], "Via Roma 1, 00184");
    assert_eq!(body["deliveryNotes"], "Ring twice");
    assert_eq!(body["items"][0]["productId"], 1);
    assert_eq!(body["items"][0]["quantity"], 1);
    assert_eq!(body["items"][0]["unitPrice"], json!(12.5));
    assert_eq!(body["items"][0]["customization"]["size"], "large");
    assert_eq!(body["items"][1]["productId"], 3);
    assert_eq!(body["items"][1]["quantity"], 2);
    assert_eq!(body["items"][1]["unitPrice"], json!(5.0));

    let key = orders[0].idempotency_key.as_deref().unwrap();
    assert!(Uuid::parse_str(key).is_ok());

    assert_eq!(receipt.order.id.as_i64(), 1001);
    assert_eq!(receipt.points_earned, 225);
    assert!(state.cart().is_empty());

    let loyalty = state.loyalty().unwrap();
    let bonus: u64 = receipt.unlocked.iter().map(|a| a.points).sum();
    assert_eq!(loyalty.total_points(), 225 + bonus);
    assert_eq!(loyalty.stats().orders_count, 1);
}

#[tokio::test]
async fn test_checkout_with_chosen_address() {
    let backend = MockBackend::start().await;
    let mut state = logged_in(&backend).await;
    state.add_to_cart(ProductId::new(2), None).await.unwrap();

    state
        .checkout(Some(AddressId::new(1)), "")
        .await
        .unwrap();

    let orders = backend.requests_to("POST", "/api/orders");
    assert_eq!(
        orders[0].body.as_ref().unwrap()["deliveryAddress"],
        "Corso Italia 8, 20122"
    );
}

#[tokio::test]
async fn test_checkout_without_address_sends_no_order() {
    let backend = MockBackend::start().await;
    backend.set_addresses(json!([]));
    let mut state = logged_in(&backend).await;
    state.add_to_cart(ProductId::new(2), None).await.unwrap();

    let err = state.checkout(None, "").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::MissingDeliveryAddress)
    ));
    assert!(backend.requests_to("POST", "/api/orders").is_empty());
    assert_eq!(state.cart().item_count(), 1);
}

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let backend = MockBackend::start().await;
    let mut state = logged_in(&backend).await;

    let err = state.checkout(None, "").await.unwrap_err();
    assert!(matches!(err, ClientError::Cart(CartError::Empty)));
    assert!(backend.requests_to("POST", "/api/orders").is_empty());
}

#[tokio::test]
async fn test_resubmitted_cart_reuses_idempotency_key() {
    let backend = MockBackend::start().await;
    let mut state = logged_in(&backend).await;
    state.add_to_cart(ProductId::new(2), None).await.unwrap();

    let addresses = state.api().addresses().await.unwrap();
    let address = checkout::select_address(&addresses, None);
    let api = state.api().clone();

    // A retry after a lost response sends the same cart again.
    checkout::submit_order(&api, state.cart_mut(), address, "").await.unwrap();
    checkout::submit_order(&api, state.cart_mut(), address, "").await.unwrap();

    state.add_to_cart(ProductId::new(3), None).await.unwrap();
    checkout::submit_order(&api, state.cart_mut(), address, "").await.unwrap();

    let keys: Vec<String> = backend
        .requests_to("POST", "/api/orders")
        .into_iter()
        .map(|r| r.idempotency_key.unwrap())
        .collect();
    assert_eq!(keys.len(), 3);
    assert_eq!(keys[0], keys[1]);
    assert_ne!(keys[1], keys[2]);
}

#[tokio::test]
async fn test_unavailable_product_not_added() {
    let backend = MockBackend::start().await;
    let mut state = logged_in(&backend).await;

    let err = state
        .add_to_cart(ProductId::new(SOLD_OUT_PRODUCT), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Cart(CartError::Unavailable(_))));
    assert!(state.cart().is_empty());
}
