//! Foodcourt Core - Domain types and client-side state.
//!
//! This crate holds everything the ordering client computes locally:
//! - the cart and pizza customization pricing
//! - the loyalty account (points, tiers, achievements, rewards)
//! - favorites, recently viewed products, and shopping lists
//! - menu search, product recommendations, and form validation
//!
//! # Architecture
//!
//! The core crate contains only types and pure state containers - no I/O, no
//! HTTP clients, no storage. The `foodcourt-client` crate loads and persists
//! these values and talks to the backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money, emails, and statuses
//! - [`cart`] - Cart lines keyed by product and customization
//! - [`loyalty`] - Points, tiers, achievements, and rewards

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod customization;
pub mod favorites;
pub mod loyalty;
pub mod order;
pub mod product;
pub mod recently_viewed;
pub mod recommend;
pub mod search;
pub mod shopping_list;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartError, CartLine, LineKey};
pub use customization::{Crust, Customization, CustomizationError, Size};
pub use favorites::Favorites;
pub use loyalty::{LoyaltyAccount, Tier};
pub use order::{Address, Order, OrderItem, OrderLine, OrderRequest};
pub use product::Product;
pub use recently_viewed::RecentlyViewed;
pub use recommend::{Recommendation, RecommendationContext, recommend};
pub use search::{ProductFilter, ProductSortKey};
pub use shopping_list::{ShoppingList, ShoppingListError, ShoppingListItem, ShoppingLists};
pub use types::*;
pub use validation::{ContactForm, ReviewForm, SignupForm, ValidationError, ValidationErrors};
