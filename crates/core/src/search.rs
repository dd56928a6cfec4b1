//! Menu search: text query, filters, and sorting over a product list.
//!
//! Everything here runs on the product list the client already holds; the
//! backend has no search endpoint.

use core::cmp::Ordering;

use crate::product::Product;
use crate::types::{Money, ParseEnumError, ProductCategory};

/// Sort keys for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductSortKey {
    /// Sort by name, ignoring case.
    Name,
    /// Sort by price.
    Price,
    /// Sort by average rating. Unrated products rank below every rated one.
    Rating,
}

impl ProductSortKey {
    pub const ALL: [Self; 3] = [Self::Name, Self::Price, Self::Rating];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::Rating => "rating",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Name => a
                .name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name)),
            Self::Price => a.price.cmp(&b.price),
            Self::Rating => {
                let rank = |p: &Product| p.average_rating.unwrap_or(f64::NEG_INFINITY);
                rank(a).total_cmp(&rank(b))
            }
        }
    }
}

impl core::str::FromStr for ProductSortKey {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "sort key",
                value: s.to_owned(),
            })
    }
}

/// A product query. The default matches every product and keeps menu order.
///
/// ```
/// use foodcourt_core::{Money, ProductFilter, ProductSortKey};
///
/// let filter = ProductFilter {
///     query: Some("pepperoni".to_string()),
///     max_price: Some(Money::from_euros(12)),
///     sort_key: Some(ProductSortKey::Price),
///     ..ProductFilter::default()
/// };
/// assert!(filter.apply(&[]).is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Case-insensitive text matched against name and description.
    pub query: Option<String>,
    /// Allowed categories; empty allows all.
    pub categories: Vec<ProductCategory>,
    /// Inclusive lower price bound.
    pub min_price: Option<Money>,
    /// Inclusive upper price bound.
    pub max_price: Option<Money>,
    /// Minimum average rating. Unrated products never pass.
    pub min_rating: Option<f64>,
    /// Only products that can be put in a cart.
    pub available_only: bool,
    pub sort_key: Option<ProductSortKey>,
    /// Sort descending instead of ascending.
    pub reverse: bool,
}

impl ProductFilter {
    /// Returns `true` if `product` passes every filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let query = self
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        if let Some(query) = query
            && !product.name.to_lowercase().contains(&query)
            && !product.description.to_lowercase().contains(&query)
        {
            return false;
        }

        (self.categories.is_empty() || self.categories.contains(&product.category))
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
            && self.min_rating.is_none_or(|min| product.rated_at_least(min))
            && (!self.available_only || product.is_orderable())
    }

    /// Filter and sort `products`.
    ///
    /// The sort is stable: products that compare equal keep their menu order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let mut matched: Vec<&Product> = products.iter().filter(|p| self.matches(p)).collect();
        if let Some(key) = self.sort_key {
            matched.sort_by(|a, b| {
                let ordering = key.compare(a, b);
                if self.reverse { ordering.reverse() } else { ordering }
            });
        }
        matched
    }
}
