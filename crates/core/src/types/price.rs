//! Type-safe price representation using decimal arithmetic.
//!
//! All catalog prices are rupee amounts. Arithmetic goes through
//! [`rust_decimal::Decimal`] so line totals never accumulate float error.

use std::iter::Sum;
use std::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum PriceError {
    /// The amount is negative.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
}

/// A non-negative rupee amount.
///
/// Serializes transparently as its decimal amount, matching the numeric
/// `price` field stored on product documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// The zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal rupee amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole rupee amount.
    #[must_use]
    pub fn from_rupees(rupees: u64) -> Self {
        Self(Decimal::from(rupees))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether this price is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\u{20b9}{:.2}", self.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative_amount() {
        assert!(Price::new(Decimal::from(-1)).is_err());
        assert!(Price::new(Decimal::ZERO).is_ok());
        assert!(Price::new(Decimal::from(120)).is_ok());
    }

    #[test]
    fn test_line_total_arithmetic() {
        let unit = Price::from_rupees(120);
        assert_eq!((unit * 3).amount(), Decimal::from(360));
    }

    #[test]
    fn test_sum_of_line_totals() {
        let total: Price = [Price::from_rupees(120) * 2, Price::from_rupees(80)]
            .into_iter()
            .sum();
        assert_eq!(total.amount(), Decimal::from(320));
    }

    #[test]
    fn test_display_in_rupees() {
        // 99.50 rupees stored as mantissa 9950, scale 2
        let price = Price::new(Decimal::new(9950, 2)).expect("non-negative");
        assert_eq!(price.to_string(), "\u{20b9}99.50");
    }

    #[test]
    fn test_value_equality_ignores_scale() {
        let a = Price::new(Decimal::new(12000, 2)).expect("non-negative");
        let b = Price::from_rupees(120);
        assert_eq!(a, b);
    }
}
