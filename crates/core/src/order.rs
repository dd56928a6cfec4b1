//! Orders, order requests, and delivery addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::customization::Customization;
use crate::product::Product;
use crate::types::{AddressId, Money, OrderId, OrderStatus, ProductId};

/// A saved delivery address from `/user/addresses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    #[serde(default)]
    pub label: String,
    pub address: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// One-line form used as the order's `deliveryAddress`.
    #[must_use]
    pub fn one_line(&self) -> String {
        if self.postal_code.is_empty() {
            self.address.clone()
        } else {
            format!("{}, {}", self.address, self.postal_code)
        }
    }
}

/// One line of an order request, snapshotted from the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub items: Vec<OrderLine>,
    pub delivery_address: String,
    #[serde(default)]
    pub delivery_notes: String,
}

impl OrderRequest {
    /// Sum of the snapshotted lines.
    #[must_use]
    pub fn total(&self) -> Money {
        self.items
            .iter()
            .map(|line| line.unit_price.times(line.quantity))
            .sum()
    }
}

/// An item of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<i64>,
    pub product: Product,
    pub quantity: u32,
    pub price: Money,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub total_amount: Money,
    #[serde(default)]
    pub status: OrderStatus,
    pub delivery_address: String,
    #[serde(default)]
    pub delivery_notes: Option<String>,
    #[serde(default)]
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_delivery_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns `true` if any item of this order is from the same category as `product`.
    #[must_use]
    pub fn contains_category_of(&self, product: &Product) -> bool {
        self.items
            .iter()
            .any(|item| item.product.category == product.category)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_request_wire_format() {
        let request = OrderRequest {
            items: vec![OrderLine {
                product_id: ProductId::new(4),
                quantity: 2,
                unit_price: Money::from_cents(1250),
                customization: None,
            }],
            delivery_address: "Via Roma 1, 00100".to_string(),
            delivery_notes: String::new(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["items"][0]["productId"], 4);
        assert_eq!(json["items"][0]["quantity"], 2);
        assert!(json["items"][0].get("customization").is_none());
        assert_eq!(json["deliveryAddress"], "Via Roma 1, 00100");
        assert_eq!(request.total(), Money::from_cents(2500));
    }

    #[test]
    fn test_address_one_line() {
        let mut address = Address {
            id: AddressId::new(1),
            label: "Home".to_string(),
            address: "Via Roma 1".to_string(),
            postal_code: "00100".to_string(),
            phone: None,
            is_default: true,
        };
        assert_eq!(address.one_line(), "Via Roma 1, 00100");
        address.postal_code.clear();
        assert_eq!(address.one_line(), "Via Roma 1");
    }
}
