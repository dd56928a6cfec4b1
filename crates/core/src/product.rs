//! Menu products as served by `/products`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Money, ProductCategory, ProductId};

/// A menu item.
///
/// The server is the source of truth; the client never mutates a product,
/// it only keeps snapshots in the cart, favorites, and recently-viewed list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub category: ProductCategory,
    #[serde(default)]
    pub image_url: String,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub stock_quantity: Option<u32>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn default_available() -> bool {
    true
}

impl Product {
    /// Returns `true` if the product can be put in a cart.
    #[must_use]
    pub fn is_orderable(&self) -> bool {
        self.available && self.stock_quantity != Some(0)
    }

    /// Crust selection only applies to pizzas.
    #[must_use]
    pub fn supports_crust(&self) -> bool {
        self.category == ProductCategory::Pizza
    }

    /// Returns `true` if the product has a rating of at least `threshold`.
    #[must_use]
    pub fn rated_at_least(&self, threshold: f64) -> bool {
        self.average_rating.is_some_and(|r| r >= threshold)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build a product for tests.
    pub fn product(id: i64, category: ProductCategory, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Money::from_cents(cents),
            category,
            image_url: String::new(),
            available: true,
            stock_quantity: None,
            average_rating: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn pizza(id: i64, cents: i64) -> Product {
        product(id, ProductCategory::Pizza, cents)
    }
}
