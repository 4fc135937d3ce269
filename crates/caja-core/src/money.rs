//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  A register that closes with a 0.01 difference every few hundred sales │
//! │  is a register nobody trusts.                                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every stored amount is an i64 of minor units.                        │
//! │    Percentages are applied once per line and rounded to the cent       │
//! │    right there; totals are plain sums of rounded line amounts.          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use caja_core::money::Money;
//! use caja_core::quantity::Quantity;
//! use caja_core::types::Rate;
//!
//! let unit_price = Money::from_cents(500);
//! let gross = unit_price.times(Quantity::from_units(2));
//! assert_eq!(gross.cents(), 1000);
//!
//! let tax = gross.percent(Rate::from_percent(10));
//! assert_eq!(tax.cents(), 100);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use ts_rs::TS;

use crate::quantity::Quantity;
use crate::types::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: ledger balances go negative on overpayment
/// - **Transparent in SQLite**: stored as a plain INTEGER column
/// - **No float constructor**: amounts arrive as cents or not at all
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  SaleLine.unit_price ──► gross ──► discount ──► net ──► tax ──► total   │
/// │                                                                         │
/// │  Sale.total ──┬──► RegisterSession.cash_sales / card_sales / ...        │
/// │               └──► CustomerLedger charge ──► Customer.current_balance  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use caja_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units * 100)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the given percentage of this amount, rounded to the cent.
    ///
    /// Rounds half away from zero, so a refund computes the mirror image of
    /// the original charge. Saturates at the `i64` bounds; posting code uses
    /// [`checked_percent`](Self::checked_percent) instead.
    ///
    /// ```rust
    /// use caja_core::money::Money;
    /// use caja_core::types::Rate;
    ///
    /// let base = Money::from_cents(1000);
    /// assert_eq!(base.percent(Rate::from_bps(825)).cents(), 83);
    /// assert_eq!(Money::from_cents(-1000).percent(Rate::from_bps(825)).cents(), -83);
    /// ```
    pub fn percent(&self, rate: Rate) -> Money {
        Money(saturate(self.scaled_percent(rate)))
    }

    /// Like [`percent`](Self::percent), `None` when the result leaves `i64`.
    pub fn checked_percent(&self, rate: Rate) -> Option<Money> {
        i64::try_from(self.scaled_percent(rate)).ok().map(Money)
    }

    /// Multiplies a unit price by a (possibly fractional) quantity.
    ///
    /// Saturates at the `i64` bounds; posting code uses
    /// [`checked_times`](Self::checked_times) instead.
    ///
    /// ```rust
    /// use caja_core::money::Money;
    /// use caja_core::quantity::Quantity;
    ///
    /// // 1.5 kg at 3.99/kg
    /// let line = Money::from_cents(399).times(Quantity::from_milli(1500));
    /// assert_eq!(line.cents(), 599);
    /// ```
    pub fn times(&self, quantity: Quantity) -> Money {
        Money(saturate(self.scaled_times(quantity)))
    }

    /// Like [`times`](Self::times), `None` when the result leaves `i64`.
    pub fn checked_times(&self, quantity: Quantity) -> Option<Money> {
        i64::try_from(self.scaled_times(quantity)).ok().map(Money)
    }

    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    #[inline]
    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    #[inline]
    pub fn saturating_add(&self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    fn scaled_percent(&self, rate: Rate) -> i128 {
        div_round(self.0 as i128 * rate.bps() as i128, 10_000)
    }

    fn scaled_times(&self, quantity: Quantity) -> i128 {
        div_round(self.0 as i128 * quantity.milli() as i128, Quantity::SCALE as i128)
    }

    /// Returns `self - other`, floored at zero.
    #[inline]
    pub fn saturating_excess_over(&self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }
}

fn saturate(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Integer division rounding half away from zero.
fn div_round(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly rendering without a currency symbol.
///
/// Localised formatting (symbol, decimals) lives in the app configuration.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);
        assert_eq!(Money::from_units(12).cents(), 1200);
    }

    #[test]
    fn test_percent_rounds_half_away_from_zero() {
        // 10.00 at 8.25% = 0.825 → 0.83
        assert_eq!(Money::from_cents(1000).percent(Rate::from_bps(825)).cents(), 83);
        // 0.10 at 5% = 0.005 → 0.01
        assert_eq!(Money::from_cents(10).percent(Rate::from_bps(500)).cents(), 1);
        assert_eq!(Money::from_cents(-10).percent(Rate::from_bps(500)).cents(), -1);
        assert_eq!(Money::from_cents(500).percent(Rate::from_percent(21)).cents(), 105);
    }

    #[test]
    fn test_times_fractional_quantity() {
        let price = Money::from_cents(250);
        assert_eq!(price.times(Quantity::from_units(3)).cents(), 750);
        assert_eq!(price.times(Quantity::from_milli(333)).cents(), 83);
        assert_eq!(price.times(Quantity::zero()).cents(), 0);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let huge = Money::from_cents(i64::MAX / 2);

        assert_eq!(huge.checked_times(Quantity::from_units(3)), None);
        assert_eq!(
            huge.checked_times(Quantity::from_units(1)),
            Some(Money::from_cents(i64::MAX / 2))
        );
        assert_eq!(huge.checked_percent(Rate::from_percent(300)), None);
        assert_eq!(huge.checked_add(huge + Money::from_cents(10)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(5).checked_add(Money::from_cents(7)),
            Some(Money::from_cents(12))
        );
    }

    #[test]
    fn test_times_saturates_instead_of_wrapping() {
        let huge = Money::from_cents(i64::MAX / 2);
        assert_eq!(huge.times(Quantity::from_units(3)).cents(), i64::MAX);
        assert_eq!((-huge).times(Quantity::from_units(3)).cents(), i64::MIN);
        assert_eq!(huge.saturating_add(huge).saturating_add(huge).cents(), i64::MAX);
    }

    #[test]
    fn test_saturating_excess() {
        let tendered = Money::from_cents(2000);
        assert_eq!(tendered.saturating_excess_over(Money::from_cents(1500)).cents(), 500);
        assert_eq!(tendered.saturating_excess_over(Money::from_cents(2500)).cents(), 0);
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::from_cents(100), Money::from_cents(250), Money::from_cents(-50)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.cents(), 300);
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
        assert_eq!(Money::from_cents(-550).abs().cents(), 550);
    }
}
