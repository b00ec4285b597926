//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Integer cents fix addition, but this domain divides:                  │
//! │    price_per_kg = price_per_box / box_to_kg_ratio                      │
//! │    $100.00 / 7 kg per box = $14.285714... per kg                       │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal                                            │
//! │    Exact decimal arithmetic with 28 significant digits, and an         │
//! │    explicit 0.01 tolerance wherever user-declared amounts are          │
//! │    compared against computed totals                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mizan_core::money::Money;
//! use rust_decimal_macros::dec;
//!
//! let price = Money::new(dec!(10.99));
//!
//! // Arithmetic operations
//! let doubled = price * 2;
//! let total = price + Money::new(dec!(5.00));
//! assert_eq!(total, Money::new(dec!(15.99)));
//!
//! // Tolerance comparison for user-declared amounts
//! assert!(Money::new(dec!(200.004)).approx_eq(Money::new(dec!(200))));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::AMOUNT_TOLERANCE;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the tenant's display currency.
///
/// ## Design Decisions
/// - **Decimal (signed)**: Allows negative values for refunds and drift
/// - **Single field tuple struct**: Zero-cost abstraction over `Decimal`
/// - **Derives**: Full serde support (serialized as a string for JS safety)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, Default,
)]
#[ts(export)]
pub struct Money(#[ts(as = "String")] Decimal);

impl Money {
    /// Creates a Money value from a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Compares two amounts within [`AMOUNT_TOLERANCE`](crate::AMOUNT_TOLERANCE).
    ///
    /// ## Usage
    /// User-declared amounts arrive from free-form inputs; a declared amount
    /// within one cent of the computed total counts as settling it.
    ///
    /// ```rust
    /// use mizan_core::money::Money;
    /// use rust_decimal_macros::dec;
    ///
    /// assert!(Money::new(dec!(200)).approx_eq(Money::new(dec!(200.009))));
    /// assert!(!Money::new(dec!(200)).approx_eq(Money::new(dec!(200.02))));
    /// ```
    #[inline]
    pub fn approx_eq(&self, other: Money) -> bool {
        (self.0 - other.0).abs() < AMOUNT_TOLERANCE
    }

    /// Multiplies by a whole-unit quantity (boxes).
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * Decimal::from(qty))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows the bare amount rounded to two places.
///
/// ## Note
/// This is for error messages and debugging. Use
/// [`CurrencyFormat`](crate::config::CurrencyFormat) for UI display so the
/// tenant's currency symbol is honored.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.round_dp(2))
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a whole-unit quantity (boxes).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * Decimal::from(qty))
    }
}

/// Multiplication by a fractional quantity (kilograms).
impl Mul<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: Decimal) -> Self {
        Money(self.0 * qty)
    }
}

/// Division by a conversion ratio.
///
/// Callers must guard against a zero divisor; the ledger rejects
/// non-positive ratios with `InvalidRatio` before dividing.
impl Div<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn div(self, divisor: Decimal) -> Self {
        Money(self.0 / divisor)
    }
}

/// Summation over line amounts.
impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_and_amount() {
        let money = Money::new(dec!(10.99));
        assert_eq!(money.amount(), dec!(10.99));
    }

    #[test]
    fn test_display_rounds_to_two_places() {
        assert_eq!(format!("{}", Money::new(dec!(10.99))), "10.99");
        assert_eq!(format!("{}", Money::new(dec!(14.285714))), "14.29");
        assert_eq!(format!("{}", Money::new(dec!(-5.5))), "-5.5");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::new(dec!(10));
        let b = Money::new(dec!(5));

        assert_eq!(a + b, Money::new(dec!(15)));
        assert_eq!(a - b, Money::new(dec!(5)));
        assert_eq!(a * 3, Money::new(dec!(30)));
        assert_eq!(a * dec!(2.5), Money::new(dec!(25)));
    }

    #[test]
    fn test_division_by_ratio_is_exact_decimal() {
        // $100 per box at 8 kg per box = $12.50 per kg
        let per_kg = Money::new(dec!(100)) / dec!(8);
        assert_eq!(per_kg, Money::new(dec!(12.5)));
    }

    #[test]
    fn test_approx_eq_tolerance() {
        let total = Money::new(dec!(200));
        assert!(total.approx_eq(Money::new(dec!(200))));
        assert!(total.approx_eq(Money::new(dec!(199.995))));
        assert!(!total.approx_eq(Money::new(dec!(199.98))));
        // Exactly one cent apart is NOT within tolerance (strict <)
        assert!(!total.approx_eq(Money::new(dec!(199.99))));
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::new(dec!(-1));
        assert!(negative.is_negative());
        assert_eq!(negative.abs(), Money::new(dec!(1)));
    }

    #[test]
    fn test_sum() {
        let total: Money = [dec!(1.25), dec!(2.75), dec!(6)]
            .into_iter()
            .map(Money::new)
            .sum();
        assert_eq!(total, Money::new(dec!(10)));
    }
}
