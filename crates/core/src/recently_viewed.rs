//! Recently viewed products, persisted under the `recentlyViewed` key.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::product::Product;

/// Number of products remembered.
pub const MAX_RECENTLY_VIEWED: usize = 10;

/// Most-recent-first list of viewed products.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentlyViewed {
    products: VecDeque<Product>,
}

impl RecentlyViewed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `product` to the front, dropping any older entry for it and the
    /// oldest entry once the list is full.
    pub fn add(&mut self, product: &Product) {
        self.products.retain(|p| p.id != product.id);
        self.products.push_front(product.clone());
        self.products.truncate(MAX_RECENTLY_VIEWED);
    }

    /// Up to `limit` products, most recent first.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &Product> {
        self.products.iter().take(limit)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    #[must_use]
    pub fn contains(&self, product: &Product) -> bool {
        self.products.iter().any(|p| p.id == product.id)
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::fixtures;
    use crate::types::ProductId;

    #[test]
    fn test_eleven_views_keep_ten_most_recent() {
        let mut recent = RecentlyViewed::new();
        for id in 1..=11 {
            recent.add(&fixtures::pizza(id, 900));
        }
        let ids: Vec<i64> = recent.iter().map(|p| p.id.as_i64()).collect();
        assert_eq!(ids, vec![11, 10, 9, 8, 7, 6, 5, 4, 3, 2]);
    }

    #[test]
    fn test_revisit_moves_to_front() {
        let mut recent = RecentlyViewed::new();
        for id in 1..=3 {
            recent.add(&fixtures::pizza(id, 900));
        }
        recent.add(&fixtures::pizza(1, 900));
        let ids: Vec<ProductId> = recent.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![ProductId::new(1), ProductId::new(3), ProductId::new(2)]);
        assert_eq!(recent.len(), 3);
    }

    #[test]
    fn test_recent_limit() {
        let mut recent = RecentlyViewed::new();
        for id in 1..=5 {
            recent.add(&fixtures::pizza(id, 900));
        }
        assert_eq!(recent.recent(2).count(), 2);
        assert_eq!(recent.recent(20).count(), 5);
    }
}
