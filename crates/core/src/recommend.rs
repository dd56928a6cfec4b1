//! Personal product recommendations.
//!
//! Each catalog product is scored against the user's order history, browsing
//! and favorites. Products with a positive score are returned best first.

use chrono::{DateTime, Duration, Utc};

use crate::cart::Cart;
use crate::favorites::Favorites;
use crate::order::Order;
use crate::product::Product;
use crate::recently_viewed::RecentlyViewed;
use crate::types::Money;

/// Default number of recommendations returned.
pub const DEFAULT_LIMIT: usize = 6;

const CATEGORY_ORDER_POINTS: i32 = 10;
const PRICE_MATCH_POINTS: i32 = 15;
const RECENTLY_VIEWED_POINTS: i32 = 20;
const FAVORITE_POINTS: i32 = 25;
const HIGH_RATING_POINTS: i32 = 10;
const NEW_PRODUCT_POINTS: i32 = 5;
const IN_CART_PENALTY: i32 = 50;

const PRICE_MATCH_WINDOW: Money = Money::from_euros(5);
const HIGH_RATING: f64 = 4.0;
const NEW_PRODUCT_DAYS: i64 = 14;
const FULL_CONFIDENCE_SCORE: f64 = 50.0;

/// Everything the scorer looks at besides the catalog.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationContext<'a> {
    pub orders: &'a [Order],
    pub recently_viewed: &'a RecentlyViewed,
    pub favorites: &'a Favorites,
    pub cart: &'a Cart,
    pub now: DateTime<Utc>,
    pub limit: usize,
}

/// A scored product.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub product: Product,
    pub score: i32,
    pub reasons: Vec<String>,
    /// `score / 50`, capped at 1.
    pub confidence: f64,
}

impl Recommendation {
    #[must_use]
    pub fn reason(&self) -> String {
        self.reasons.join(", ")
    }
}

/// Average order total, or `None` without history.
fn average_order_value(orders: &[Order]) -> Option<Money> {
    let count = i64::try_from(orders.len()).ok().filter(|&n| n > 0)?;
    let total: Money = orders.iter().map(|o| o.total_amount).sum();
    Some(Money::from_cents(total.cents() / count))
}

fn score(product: &Product, ctx: &RecommendationContext<'_>, average: Option<Money>) -> Recommendation {
    let mut score = 0;
    let mut reasons = Vec::new();

    let category_orders = ctx
        .orders
        .iter()
        .filter(|order| order.contains_category_of(product))
        .count();
    if category_orders > 0 {
        let count = i32::try_from(category_orders).unwrap_or(i32::MAX);
        score += count.saturating_mul(CATEGORY_ORDER_POINTS);
        reasons.push(format!("{category_orders} past orders from this category"));
    }

    if average.is_some_and(|avg| product.price.abs_diff(avg) < PRICE_MATCH_WINDOW) {
        score += PRICE_MATCH_POINTS;
        reasons.push("Matches your typical spending".to_string());
    }

    if ctx.recently_viewed.contains(product) {
        score += RECENTLY_VIEWED_POINTS;
        reasons.push("Recently viewed".to_string());
    }

    if ctx.favorites.contains(product.id) {
        score += FAVORITE_POINTS;
        reasons.push("In your favorites".to_string());
    }

    if product.rated_at_least(HIGH_RATING) {
        score += HIGH_RATING_POINTS;
        reasons.push("Highly rated".to_string());
    }

    if product
        .created_at
        .is_some_and(|created| ctx.now - created <= Duration::days(NEW_PRODUCT_DAYS))
    {
        score += NEW_PRODUCT_POINTS;
        reasons.push("New addition".to_string());
    }

    if ctx.cart.contains_product(product.id) {
        score -= IN_CART_PENALTY;
        reasons.push("Already in cart".to_string());
    }

    Recommendation {
        product: product.clone(),
        score,
        reasons,
        confidence: (f64::from(score) / FULL_CONFIDENCE_SCORE).min(1.0),
    }
}

/// Score `products` and return the best `ctx.limit` with a positive score.
///
/// Ties keep catalog order.
#[must_use]
pub fn recommend(products: &[Product], ctx: &RecommendationContext<'_>) -> Vec<Recommendation> {
    let average = average_order_value(ctx.orders);
    let mut scored: Vec<Recommendation> = products
        .iter()
        .map(|product| score(product, ctx, average))
        .filter(|r| r.score > 0)
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(ctx.limit);
    scored
}
