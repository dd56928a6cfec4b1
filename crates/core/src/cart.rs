//! Shopping cart.
//!
//! Lines are kept in insertion order. A line's identity is its [`LineKey`]:
//! the product id plus the customization signature, if any. Adding a product
//! whose key already exists bumps that line's quantity; anything else appends
//! a new line. Quantities never go below one; reaching zero removes the line.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::customization::{Customization, CustomizationError};
use crate::order::{OrderLine, OrderRequest};
use crate::product::Product;
use crate::types::{Money, ProductId};

/// Errors raised by cart operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("{0} is not available")]
    Unavailable(String),
    #[error("invalid customization: {0}")]
    Customization(#[from] CustomizationError),
    #[error("cart is empty")]
    Empty,
}

/// Identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineKey {
    pub product_id: ProductId,
    pub signature: Option<String>,
}

impl LineKey {
    /// Key of an uncustomized line.
    #[must_use]
    pub const fn plain(product_id: ProductId) -> Self {
        Self {
            product_id,
            signature: None,
        }
    }

    /// Key for a product with an optional customization.
    #[must_use]
    pub fn new(product_id: ProductId, customization: Option<&Customization>) -> Self {
        Self {
            product_id,
            signature: customization.map(Customization::signature),
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.signature {
            Some(sig) => write!(f, "{}[{sig}]", self.product_id),
            None => write!(f, "{}", self.product_id),
        }
    }
}

/// One entry in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
    #[serde(default)]
    pub customization: Option<Customization>,
}

impl CartLine {
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product.id, self.customization.as_ref())
    }

    /// Price of one unit, including customization.
    #[must_use]
    pub fn unit_price(&self) -> Money {
        self.customization
            .as_ref()
            .map_or(self.product.price, |c| c.total_price(self.product.price))
    }

    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price().times(self.quantity)
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        if self.customization.is_some() {
            Customization::display_name(&self.product.name)
        } else {
            self.product.name.clone()
        }
    }
}

/// The cart.
///
/// Besides the lines, the cart remembers the idempotency key of the pending
/// order submission. The key is minted on the first submit and survives
/// retries; any mutation of the cart drops it, so a changed cart is a new order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    lines: Vec<CartLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    idempotency_key: Option<Uuid>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `product`.
    ///
    /// Merges into the line with the same key, or appends a new line with
    /// quantity 1. Returns the key of the affected line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Unavailable`] for products that cannot be ordered
    /// and [`CartError::Customization`] for an invalid customization.
    pub fn add(
        &mut self,
        product: &Product,
        customization: Option<Customization>,
    ) -> Result<LineKey, CartError> {
        if !product.is_orderable() {
            return Err(CartError::Unavailable(product.name.clone()));
        }
        if let Some(custom) = &customization {
            custom.validate(product)?;
        }

        let key = LineKey::new(product.id, customization.as_ref());
        self.touch();

        if let Some(line) = self.line_mut(&key) {
            line.quantity = line.quantity.saturating_add(1);
        } else {
            self.lines.push(CartLine {
                product: product.clone(),
                quantity: 1,
                customization,
            });
        }
        Ok(key)
    }

    /// Remove one unit from the matching line, deleting it at zero.
    ///
    /// Returns the remaining quantity, or `None` if no line matched.
    pub fn remove(&mut self, key: &LineKey) -> Option<u32> {
        let index = self.position(key)?;
        self.touch();
        let line = self.lines.get_mut(index)?;
        line.quantity = line.quantity.saturating_sub(1);
        let remaining = line.quantity;
        if remaining == 0 {
            self.lines.remove(index);
        }
        Some(remaining)
    }

    /// Set a line's quantity; zero or less deletes the line.
    ///
    /// Returns `false` if no line matched.
    pub fn set_quantity(&mut self, key: &LineKey, quantity: i64) -> bool {
        let Some(index) = self.position(key) else {
            return false;
        };
        self.touch();
        match u32::try_from(quantity) {
            Ok(n) if n > 0 => {
                if let Some(line) = self.lines.get_mut(index) {
                    line.quantity = n;
                }
            }
            Ok(_) => {
                self.lines.remove(index);
            }
            Err(_) if quantity > 0 => {
                if let Some(line) = self.lines.get_mut(index) {
                    line.quantity = u32::MAX;
                }
            }
            Err(_) => {
                self.lines.remove(index);
            }
        }
        true
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.idempotency_key = None;
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.key() == *key)
    }

    /// Key of the line at a zero-based position.
    #[must_use]
    pub fn key_at(&self, index: usize) -> Option<LineKey> {
        self.lines.get(index).map(CartLine::key)
    }

    /// Returns `true` if any line holds `product_id`, customized or not.
    #[must_use]
    pub fn contains_product(&self, product_id: ProductId) -> bool {
        self.lines.iter().any(|line| line.product.id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }

    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Idempotency key for submitting the current contents.
    pub fn idempotency_key(&mut self) -> Uuid {
        *self.idempotency_key.get_or_insert_with(Uuid::new_v4)
    }

    /// Snapshot the cart into an order request.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Empty`] if there is nothing to order.
    pub fn to_order_request(
        &self,
        delivery_address: impl Into<String>,
        delivery_notes: impl Into<String>,
    ) -> Result<OrderRequest, CartError> {
        if self.is_empty() {
            return Err(CartError::Empty);
        }
        Ok(OrderRequest {
            items: self
                .lines
                .iter()
                .map(|line| OrderLine {
                    product_id: line.product.id,
                    quantity: line.quantity,
                    unit_price: line.unit_price(),
                    customization: line.customization.clone(),
                })
                .collect(),
            delivery_address: delivery_address.into(),
            delivery_notes: delivery_notes.into(),
        })
    }

    fn position(&self, key: &LineKey) -> Option<usize> {
        self.lines.iter().position(|line| line.key() == *key)
    }

    fn line_mut(&mut self, key: &LineKey) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.key() == *key)
    }

    fn touch(&mut self) {
        self.idempotency_key = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::customization::Size;
    use crate::product::fixtures;
    use crate::types::ProductCategory;

    #[test]
    fn test_add_merges_plain_lines() {
        let mut cart = Cart::new();
        let pizza = fixtures::pizza(1, 1000);
        cart.add(&pizza, None).unwrap();
        cart.add(&pizza, None).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.subtotal(), Money::from_cents(2000));
    }

    #[test]
    fn test_different_customizations_never_merge() {
        let mut cart = Cart::new();
        let pizza = fixtures::pizza(1, 1000);
        let small = Customization::for_product(&pizza).with_size(Size::Small);
        let large = Customization::for_product(&pizza).with_size(Size::Large);

        cart.add(&pizza, Some(small.clone())).unwrap();
        cart.add(&pizza, Some(large)).unwrap();
        cart.add(&pizza, None).unwrap();
        assert_eq!(cart.lines().len(), 3);

        cart.add(&pizza, Some(small.clone())).unwrap();
        assert_eq!(cart.lines().len(), 3);
        let key = LineKey::new(pizza.id, Some(&small));
        assert_eq!(cart.line(&key).unwrap().quantity, 2);
    }

    #[test]
    fn test_remove_is_net_of_adds() {
        let mut cart = Cart::new();
        let salad = fixtures::product(7, ProductCategory::Salad, 750);
        let key = LineKey::plain(salad.id);
        for _ in 0..3 {
            cart.add(&salad, None).unwrap();
        }
        assert_eq!(cart.remove(&key), Some(2));
        assert_eq!(cart.remove(&key), Some(1));
        assert_eq!(cart.remove(&key), Some(0));
        assert!(cart.is_empty());
        assert_eq!(cart.remove(&key), None);
    }

    #[test]
    fn test_interleaved_add_remove_sequence() {
        let mut cart = Cart::new();
        let a = fixtures::product(1, ProductCategory::Side, 300);
        let b = fixtures::product(2, ProductCategory::Dessert, 450);
        let (ka, kb) = (LineKey::plain(a.id), LineKey::plain(b.id));

        // +a +b +a -a -b -b +b +a
        cart.add(&a, None).unwrap();
        cart.add(&b, None).unwrap();
        cart.add(&a, None).unwrap();
        cart.remove(&ka);
        cart.remove(&kb);
        cart.remove(&kb);
        cart.add(&b, None).unwrap();
        cart.add(&a, None).unwrap();

        assert_eq!(cart.line(&ka).unwrap().quantity, 2);
        assert_eq!(cart.line(&kb).unwrap().quantity, 1);
        // b was deleted and re-added, so it now sits after a
        assert_eq!(cart.key_at(1), Some(kb));
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = Cart::new();
        let burger = fixtures::product(3, ProductCategory::Burger, 1100);
        let key = cart.add(&burger, None).unwrap();

        assert!(cart.set_quantity(&key, 5));
        assert_eq!(cart.item_count(), 5);
        assert!(cart.set_quantity(&key, 0));
        assert!(cart.is_empty());

        let key = cart.add(&burger, None).unwrap();
        assert!(cart.set_quantity(&key, -3));
        assert!(cart.is_empty());
        assert!(!cart.set_quantity(&key, 2));
    }

    #[test]
    fn test_unavailable_product_is_rejected() {
        let mut cart = Cart::new();
        let mut pizza = fixtures::pizza(1, 1000);
        pizza.available = false;
        assert!(matches!(cart.add(&pizza, None), Err(CartError::Unavailable(_))));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_customized_line_price_and_name() {
        let mut cart = Cart::new();
        let pizza = fixtures::pizza(1, 1000);
        let mut custom = Customization::for_product(&pizza).with_size(Size::Medium);
        custom.toggle_topping("pepperoni").unwrap();
        let key = cart.add(&pizza, Some(custom)).unwrap();
        cart.add(&pizza, None).unwrap();

        let line = cart.line(&key).unwrap();
        assert_eq!(line.unit_price(), Money::from_cents(1400));
        assert_eq!(line.display_name(), "Product 1 (Customized)");
        assert_eq!(cart.subtotal(), Money::from_cents(2400));
    }

    #[test]
    fn test_idempotency_key_is_stable_until_mutation() {
        let mut cart = Cart::new();
        let pizza = fixtures::pizza(1, 1000);
        cart.add(&pizza, None).unwrap();

        let first = cart.idempotency_key();
        assert_eq!(cart.idempotency_key(), first);

        cart.add(&pizza, None).unwrap();
        assert_ne!(cart.idempotency_key(), first);
    }

    #[test]
    fn test_order_request_snapshot() {
        let mut cart = Cart::new();
        assert_eq!(cart.to_order_request("a", ""), Err(CartError::Empty));

        let pizza = fixtures::pizza(1, 1000);
        cart.add(&pizza, None).unwrap();
        cart.add(&pizza, None).unwrap();
        let request = cart.to_order_request("Via Roma 1", "ring twice").unwrap();
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].quantity, 2);
        assert_eq!(request.total(), Money::from_cents(2000));
        assert_eq!(request.delivery_notes, "ring twice");
        // The snapshot leaves the cart untouched.
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_cart_survives_json_round_trip() {
        let mut cart = Cart::new();
        cart.add(&fixtures::pizza(1, 1000), None).unwrap();
        let key = cart.idempotency_key();
        let json = serde_json::to_string(&cart).unwrap();
        let mut back: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(back.idempotency_key(), key);
        assert_eq!(back.item_count(), 1);
    }
}
