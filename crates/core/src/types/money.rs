//! Money held in integer minor units.
//!
//! The backend speaks decimal euros (`10.5`). Everything the client computes
//! is done in whole cents so that a customized pizza never drifts by a cent;
//! `rust_decimal` is only used at the edges, to parse wire values and to
//! format for display.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Sub};
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when converting a decimal amount to [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount does not fit in the cent range.
    #[error("amount {0} is out of range")]
    OutOfRange(Decimal),
    /// The text is not a decimal amount.
    #[error("invalid amount: {0:?}")]
    Invalid(String),
}

/// An amount of euros, stored as cents.
///
/// Serialized as a decimal euro number to match the backend
/// (`Money::from_cents(1050)` <-> `10.5`).
///
/// ```
/// use foodcourt_core::Money;
///
/// let base = Money::from_cents(1000);
/// let total = base + Money::from_cents(250);
/// assert_eq!(total.to_string(), "€12.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Zero euros.
    pub const ZERO: Self = Self(0);

    /// Create an amount from cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create an amount from whole euros.
    #[must_use]
    pub const fn from_euros(euros: i64) -> Self {
        Self(euros * 100)
    }

    /// Convert a decimal euro amount, rounding half-to-even at the cent.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::OutOfRange`] if the amount does not fit in `i64` cents.
    pub fn from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        let mut rounded = amount.round_dp(2);
        rounded.rescale(2);
        i64::try_from(rounded.mantissa())
            .map(Self)
            .map_err(|_| MoneyError::OutOfRange(amount))
    }

    /// The amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// The amount as a two-place decimal.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Absolute difference between two amounts.
    #[must_use]
    pub const fn abs_diff(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0).saturating_abs())
    }

    /// Whole euros, rounded down.
    #[must_use]
    pub const fn whole_euros(self) -> i64 {
        self.0.div_euclid(100)
    }

    /// Returns `true` if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "€{}", self.to_decimal())
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    /// Parse a euro amount such as `9.50` or `€9.50`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('€').unwrap_or(trimmed).trim_start();
        let amount = Decimal::from_str(digits).map_err(|_| MoneyError::Invalid(s.to_owned()))?;
        Self::from_decimal(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // The backend expects a JSON number, not a string.
        serializer.serialize_f64(self.to_decimal().to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::from_decimal(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_two_places() {
        assert_eq!(Money::from_cents(1400).to_string(), "€14.00");
        assert_eq!(Money::from_cents(5).to_string(), "€0.05");
        assert_eq!(Money::ZERO.to_string(), "€0.00");
    }

    #[test]
    fn test_from_decimal_rounds_to_cents() {
        let m = Money::from_decimal(Decimal::from_str("1.005").unwrap()).unwrap();
        assert_eq!(m.cents(), 100);
        let m = Money::from_decimal(Decimal::from_str("1.015").unwrap()).unwrap();
        assert_eq!(m.cents(), 102);
        let m = Money::from_decimal(Decimal::from_str("12").unwrap()).unwrap();
        assert_eq!(m.cents(), 1200);
    }

    #[test]
    fn test_deserialize_from_number_and_string() {
        let m: Money = serde_json::from_str("10.5").unwrap();
        assert_eq!(m, Money::from_cents(1050));
        let m: Money = serde_json::from_str("\"2.25\"").unwrap();
        assert_eq!(m, Money::from_cents(225));
    }

    #[test]
    fn test_parse_euro_amounts() {
        assert_eq!("9.50".parse::<Money>().unwrap(), Money::from_cents(950));
        assert_eq!("€12".parse::<Money>().unwrap(), Money::from_cents(1200));
        assert!(matches!("ten".parse::<Money>(), Err(MoneyError::Invalid(_))));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&Money::from_cents(1450)).unwrap();
        assert_eq!(json, "14.5");
    }

    #[test]
    fn test_fractional_addons_do_not_drift() {
        // 0.1 + 0.2 in floating point is 0.30000000000000004
        let total: Money = [Money::from_cents(10), Money::from_cents(20)].iter().sum();
        assert_eq!(total, Money::from_cents(30));
    }

    #[test]
    fn test_times_and_whole_euros() {
        assert_eq!(Money::from_cents(1299).times(3), Money::from_cents(3897));
        assert_eq!(Money::from_cents(3897).whole_euros(), 38);
        assert_eq!(
            Money::from_cents(1000).abs_diff(Money::from_cents(1450)),
            Money::from_cents(450)
        );
    }
}
