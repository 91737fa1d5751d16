//! Fixed-point decimal types for prices and quantities
//!
//! Uses rust_decimal for exact arithmetic; no floating point anywhere in
//! the matching path. Rounding, where it happens at all (fees), is
//! half-away-from-zero at the instrument's quote precision.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Price with fixed-point decimal representation.
///
/// Always strictly positive. Ordered, so it can key a price-sorted map.
/// Serialized as a string to prevent JSON number precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price.
    ///
    /// # Panics
    /// Panics if the value is negative or zero.
    pub fn new(value: Decimal) -> Self {
        assert!(value > Decimal::ZERO, "Price must be positive");
        Self(value)
    }

    /// Try to create a Price, returning None if non-positive.
    pub fn try_new(value: Decimal) -> Option<Self> {
        (value > Decimal::ZERO).then_some(Self(value))
    }

    /// Create from an integer (tests and fixtures).
    pub fn from_u64(value: u64) -> Self {
        Self::new(Decimal::from(value))
    }

    /// Create from a decimal string.
    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Self::new(Decimal::from_str(s)?))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(self.0 >= rhs.0, "Price subtraction would go negative");
        Self(self.0 - rhs.0)
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Self::try_new(decimal).ok_or_else(|| serde::de::Error::custom("Price must be positive"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity with fixed-point decimal representation.
///
/// Never negative. Zero is representable because a remaining quantity
/// reaches zero exactly when an order is fully consumed.
/// Serialized as a string to prevent JSON number precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Create a new strictly positive Quantity.
    ///
    /// # Panics
    /// Panics if the value is negative or zero.
    pub fn new(value: Decimal) -> Self {
        assert!(value > Decimal::ZERO, "Quantity must be positive");
        Self(value)
    }

    /// Try to create a strictly positive Quantity.
    pub fn try_new(value: Decimal) -> Option<Self> {
        (value > Decimal::ZERO).then_some(Self(value))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Create from an integer (tests and fixtures).
    pub fn from_u64(value: u64) -> Self {
        Self::new(Decimal::from(value))
    }

    /// Create from a decimal string.
    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Self::new(Decimal::from_str(s)?))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The smaller of two quantities; a fill is the min of both remainders.
    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Subtract without going negative; clamps at zero.
    pub fn saturating_sub(self, rhs: Self) -> Self {
        if self.0 <= rhs.0 {
            Self(Decimal::ZERO)
        } else {
            Self(self.0 - rhs.0)
        }
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(self.0 >= rhs.0, "Quantity subtraction would go negative");
        Self(self.0 - rhs.0)
    }
}

impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        if decimal >= Decimal::ZERO {
            Ok(Self(decimal))
        } else {
            Err(serde::de::Error::custom("Quantity cannot be negative"))
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round a quote-currency amount half-away-from-zero at the given precision.
pub fn round_quote(amount: Decimal, quote_precision: u32) -> Decimal {
    amount.round_dp_with_strategy(quote_precision, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_creation() {
        let price = Price::from_str("50000.25").unwrap();
        assert_eq!(price.as_decimal(), Decimal::from_str("50000.25").unwrap());
    }

    #[test]
    #[should_panic(expected = "Price must be positive")]
    fn test_price_zero_panics() {
        Price::new(Decimal::ZERO);
    }

    #[test]
    fn test_price_ordering() {
        let lo = Price::from_str("99.99").unwrap();
        let hi = Price::from_u64(100);
        assert!(lo < hi);
        // Trailing zeros do not affect identity
        assert_eq!(Price::from_str("100.00").unwrap(), hi);
    }

    #[test]
    fn test_price_serialization() {
        let price = Price::from_str("100.50").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"100.50\"");
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(price, back);
    }

    #[test]
    fn test_quantity_min_is_exact() {
        let a = Quantity::from_str("1.5").unwrap();
        let b = Quantity::from_str("0.7").unwrap();
        assert_eq!(a.min(b), b);
        assert_eq!(b.min(a), b);
    }

    #[test]
    fn test_quantity_saturating_sub() {
        let a = Quantity::from_str("1.0").unwrap();
        let b = Quantity::from_str("2.0").unwrap();
        assert!(a.saturating_sub(b).is_zero());
        assert_eq!(
            b.saturating_sub(a),
            Quantity::from_str("1.0").unwrap()
        );
    }

    #[test]
    fn test_quantity_rejects_negative_on_deserialize() {
        assert!(serde_json::from_str::<Quantity>("\"-1\"").is_err());
        let zero: Quantity = serde_json::from_str("\"0\"").unwrap();
        assert!(zero.is_zero());
    }

    #[test]
    fn test_round_quote_half_away_from_zero() {
        assert_eq!(
            round_quote(Decimal::from_str("0.101").unwrap(), 2),
            Decimal::from_str("0.10").unwrap()
        );
        assert_eq!(
            round_quote(Decimal::from_str("0.0505").unwrap(), 2),
            Decimal::from_str("0.05").unwrap()
        );
        // Exact midpoint rounds away from zero
        assert_eq!(
            round_quote(Decimal::from_str("0.125").unwrap(), 2),
            Decimal::from_str("0.13").unwrap()
        );
    }

    #[test]
    fn test_exact_arithmetic_is_deterministic() {
        let q = Quantity::from_str("0.123456789").unwrap();
        let p = Price::from_str("50000.987654321").unwrap();
        let v1 = q.as_decimal() * p.as_decimal();
        let v2 = q.as_decimal() * p.as_decimal();
        assert_eq!(v1, v2);
    }
}
