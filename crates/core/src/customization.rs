//! Product customization: size, crust, toppings, extras.
//!
//! Pricing is a pure function of the base price and the selected options:
//!
//! ```text
//! total = base + size delta + crust delta + Σ toppings + Σ extras
//! ```
//!
//! A customization also has a canonical [`signature`](Customization::signature)
//! which is part of a cart line's identity, so two differently customized
//! pizzas never coalesce even when their totals happen to match.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::types::Money;

/// Errors raised when building or applying a customization.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CustomizationError {
    #[error("unknown topping: {0}")]
    UnknownTopping(String),
    #[error("unknown extra: {0}")]
    UnknownExtra(String),
    #[error("{0} does not take a crust")]
    CrustNotSupported(String),
}

/// Portion size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    #[default]
    Medium,
    Large,
    #[serde(rename = "xlarge")]
    ExtraLarge,
}

impl Size {
    pub const ALL: [Self; 4] = [Self::Small, Self::Medium, Self::Large, Self::ExtraLarge];

    /// Surcharge over the base price.
    #[must_use]
    pub const fn price_delta(self) -> Money {
        match self {
            Self::Small => Money::ZERO,
            Self::Medium => Money::from_euros(2),
            Self::Large => Money::from_euros(4),
            Self::ExtraLarge => Money::from_euros(6),
        }
    }

    /// Wire value (`small`, `medium`, `large`, `xlarge`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::ExtraLarge => "xlarge",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
            Self::ExtraLarge => "Extra Large",
        }
    }
}

/// Pizza crust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Crust {
    #[default]
    Classic,
    Thin,
    Thick,
    Stuffed,
}

impl Crust {
    pub const ALL: [Self; 4] = [Self::Classic, Self::Thin, Self::Thick, Self::Stuffed];

    /// Surcharge over the base price.
    #[must_use]
    pub const fn price_delta(self) -> Money {
        match self {
            Self::Classic => Money::ZERO,
            Self::Thin | Self::Thick => Money::from_euros(1),
            Self::Stuffed => Money::from_euros(3),
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Thin => "thin",
            Self::Thick => "thick",
            Self::Stuffed => "stuffed",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::Thin => "Thin Crust",
            Self::Thick => "Thick Crust",
            Self::Stuffed => "Stuffed Crust",
        }
    }
}

/// A priced add-on (topping or extra).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOn {
    pub id: &'static str,
    pub name: &'static str,
    pub price: Money,
    pub category: &'static str,
}

const fn add_on(id: &'static str, name: &'static str, cents: i64, category: &'static str) -> AddOn {
    AddOn {
        id,
        name,
        price: Money::from_cents(cents),
        category,
    }
}

/// Topping catalog.
pub const TOPPINGS: &[AddOn] = &[
    add_on("pepperoni", "Pepperoni", 200, "meat"),
    add_on("mushrooms", "Mushrooms", 150, "vegetable"),
    add_on("olives", "Black Olives", 150, "vegetable"),
    add_on("bacon", "Bacon", 250, "meat"),
    add_on("ham", "Ham", 200, "meat"),
    add_on("pineapple", "Pineapple", 150, "fruit"),
    add_on("bell-peppers", "Bell Peppers", 100, "vegetable"),
    add_on("onions", "Onions", 100, "vegetable"),
    add_on("cheese", "Extra Cheese", 200, "dairy"),
    add_on("jalapenos", "Jalapeños", 150, "spice"),
];

/// Extras catalog.
pub const EXTRAS: &[AddOn] = &[
    add_on("sauce", "Extra Sauce", 50, "sauce"),
    add_on("dip", "Garlic Dip", 100, "dip"),
    add_on("drink", "Soft Drink", 200, "beverage"),
    add_on("fries", "French Fries", 300, "side"),
];

/// Look up a topping by id.
#[must_use]
pub fn topping(id: &str) -> Option<&'static AddOn> {
    TOPPINGS.iter().find(|t| t.id == id)
}

/// Look up an extra by id.
#[must_use]
pub fn extra(id: &str) -> Option<&'static AddOn> {
    EXTRAS.iter().find(|e| e.id == id)
}

/// Suffix appended to the display name of a customized product.
pub const CUSTOMIZED_SUFFIX: &str = " (Customized)";

/// The options chosen for one product.
///
/// Toppings and extras are kept as ordered sets of catalog ids so that the
/// selection order never changes the signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    #[serde(default)]
    pub size: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crust: Option<Crust>,
    #[serde(default)]
    pub toppings: BTreeSet<String>,
    #[serde(default)]
    pub extras: BTreeSet<String>,
    #[serde(default)]
    pub special_instructions: String,
}

impl Customization {
    /// Default selection for a product: medium, and a classic crust for pizzas.
    #[must_use]
    pub fn for_product(product: &Product) -> Self {
        Self {
            crust: product.supports_crust().then_some(Crust::Classic),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub const fn with_crust(mut self, crust: Crust) -> Self {
        self.crust = Some(crust);
        self
    }

    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.special_instructions = instructions.into();
        self
    }

    /// Add a topping if absent, remove it if present.
    ///
    /// Returns `true` if the topping is selected afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`CustomizationError::UnknownTopping`] for ids not in [`TOPPINGS`].
    pub fn toggle_topping(&mut self, id: &str) -> Result<bool, CustomizationError> {
        let known = topping(id).ok_or_else(|| CustomizationError::UnknownTopping(id.to_owned()))?;
        Ok(toggle(&mut self.toppings, known.id))
    }

    /// Add an extra if absent, remove it if present.
    ///
    /// # Errors
    ///
    /// Returns [`CustomizationError::UnknownExtra`] for ids not in [`EXTRAS`].
    pub fn toggle_extra(&mut self, id: &str) -> Result<bool, CustomizationError> {
        let known = extra(id).ok_or_else(|| CustomizationError::UnknownExtra(id.to_owned()))?;
        Ok(toggle(&mut self.extras, known.id))
    }

    /// Check the selection against the catalogs and the product.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown add-on ids or a crust on a non-pizza.
    pub fn validate(&self, product: &Product) -> Result<(), CustomizationError> {
        if self.crust.is_some() && !product.supports_crust() {
            return Err(CustomizationError::CrustNotSupported(product.name.clone()));
        }
        if let Some(unknown) = self.toppings.iter().find(|id| topping(id).is_none()) {
            return Err(CustomizationError::UnknownTopping(unknown.clone()));
        }
        if let Some(unknown) = self.extras.iter().find(|id| extra(id).is_none()) {
            return Err(CustomizationError::UnknownExtra(unknown.clone()));
        }
        Ok(())
    }

    /// Total price of the customized product.
    #[must_use]
    pub fn total_price(&self, base: Money) -> Money {
        let toppings: Money = self
            .toppings
            .iter()
            .filter_map(|id| topping(id))
            .map(|t| t.price)
            .sum();
        let extras: Money = self
            .extras
            .iter()
            .filter_map(|id| extra(id))
            .map(|e| e.price)
            .sum();
        let crust = self.crust.map_or(Money::ZERO, Crust::price_delta);

        base + self.size.price_delta() + crust + toppings + extras
    }

    /// Canonical identity string used for cart-line merging.
    #[must_use]
    pub fn signature(&self) -> String {
        let join = |set: &BTreeSet<String>| set.iter().map(String::as_str).collect::<Vec<_>>().join(",");
        format!(
            "size={};crust={};toppings={};extras={};note={}",
            self.size.code(),
            self.crust.map_or("none", Crust::code),
            join(&self.toppings),
            join(&self.extras),
            self.special_instructions.trim(),
        )
    }

    /// Display name of a product carrying this customization.
    #[must_use]
    pub fn display_name(product_name: &str) -> String {
        format!("{product_name}{CUSTOMIZED_SUFFIX}")
    }

    /// Short human summary, e.g. `Medium, Classic, Pepperoni`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![self.size.label().to_owned()];
        if let Some(crust) = self.crust {
            parts.push(crust.label().to_owned());
        }
        parts.extend(self.toppings.iter().filter_map(|id| topping(id)).map(|t| t.name.to_owned()));
        parts.extend(self.extras.iter().filter_map(|id| extra(id)).map(|e| e.name.to_owned()));
        if !self.special_instructions.trim().is_empty() {
            parts.push(format!("\"{}\"", self.special_instructions.trim()));
        }
        parts.join(", ")
    }
}

fn toggle(set: &mut BTreeSet<String>, id: &str) -> bool {
    if set.remove(id) {
        false
    } else {
        set.insert(id.to_owned());
        true
    }
}
