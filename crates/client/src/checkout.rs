//! Order submission.

use tracing::{info, instrument};

use foodcourt_core::{Address, AddressId, Cart, Order, ValidationError};

use crate::api::ApiClient;
use crate::error::Result;

/// Pick the delivery address: the requested one, else the default, else the
/// first saved address.
#[must_use]
pub fn select_address(addresses: &[Address], requested: Option<AddressId>) -> Option<&Address> {
    match requested {
        Some(id) => addresses.iter().find(|a| a.id == id),
        None => addresses
            .iter()
            .find(|a| a.is_default)
            .or_else(|| addresses.first()),
    }
}

/// Submit the cart as one order.
///
/// The request carries the cart's idempotency key, so resubmitting an
/// unchanged cart after a lost response is recognised by the backend. The
/// cart is left untouched; the caller clears it once the order is recorded.
///
/// # Errors
///
/// Returns [`ValidationError::MissingDeliveryAddress`] without sending
/// anything if no address is selected, [`foodcourt_core::CartError::Empty`]
/// for an empty cart, and the API error if the request fails.
#[instrument(skip_all, fields(items = cart.item_count()))]
pub async fn submit_order(
    api: &ApiClient,
    cart: &mut Cart,
    address: Option<&Address>,
    notes: &str,
) -> Result<Order> {
    let address = address.ok_or(ValidationError::MissingDeliveryAddress)?;
    let request = cart.to_order_request(address.one_line(), notes)?;
    let key = cart.idempotency_key();

    let order = api.create_order(&request, key).await?;
    info!(order_id = %order.id, total = %order.total_amount, "Checkout complete");
    Ok(order)
}
