//! Core value types for Foodcourt.
//!
//! This module provides type-safe wrappers for ids, money, email addresses, and the
//! backend's status enums.

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use status::*;
