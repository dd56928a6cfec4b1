//! Favorite products, persisted under the `favorites` key.

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::types::ProductId;

/// Maximum number of favorites kept; adding beyond it drops the oldest.
pub const MAX_FAVORITES: usize = 50;

/// Set of favorite products, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites {
    products: Vec<Product>,
}

impl Favorites {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.products.iter().any(|p| p.id == product_id)
    }

    /// Add a product unless already present.
    ///
    /// Returns `true` if it was added.
    pub fn add(&mut self, product: &Product) -> bool {
        if self.contains(product.id) {
            return false;
        }
        if self.products.len() >= MAX_FAVORITES {
            self.products.remove(0);
        }
        self.products.push(product.clone());
        true
    }

    /// Returns `true` if the product was present.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.products.len();
        self.products.retain(|p| p.id != product_id);
        self.products.len() != before
    }

    /// Add if absent, remove if present. Returns `true` if now a favorite.
    pub fn toggle(&mut self, product: &Product) -> bool {
        if self.remove(product.id) {
            false
        } else {
            self.add(product)
        }
    }

    pub fn clear(&mut self) {
        self.products.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::fixtures;
    use crate::types::ProductCategory;

    #[test]
    fn test_toggle() {
        let mut favorites = Favorites::new();
        let tiramisu = fixtures::product(9, ProductCategory::Dessert, 550);

        assert!(favorites.toggle(&tiramisu));
        assert!(favorites.contains(tiramisu.id));
        assert!(!favorites.toggle(&tiramisu));
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_add_is_deduplicated() {
        let mut favorites = Favorites::new();
        let pizza = fixtures::pizza(1, 900);
        assert!(favorites.add(&pizza));
        assert!(!favorites.add(&pizza));
        assert_eq!(favorites.len(), 1);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut favorites = Favorites::new();
        // One more than the cap
        for id in 0..=50 {
            favorites.add(&fixtures::pizza(id, 900));
        }
        assert_eq!(favorites.len(), MAX_FAVORITES);
        assert!(!favorites.contains(ProductId::new(0)));
        assert!(favorites.contains(ProductId::new(1)));
    }
}
