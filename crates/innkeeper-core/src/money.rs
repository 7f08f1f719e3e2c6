//! # Money Module
//!
//! Provides the `Money` type for every amount on a booking: base tariff,
//! GST, payments, extensions, cancellation charges and refunds.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A booking must satisfy qr_amount + cash_amount == amount_paid          │
//! │  EXACTLY, after any number of payments and extensions. Floats drift.   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    ₹1180.00 = 118000 paise, sums are exact, rounding is explicit       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use innkeeper_core::money::Money;
//!
//! let tariff = Money::from_rupees(1500);      // ₹1500.00
//! let two_nights = tariff * 2;                // ₹3000.00
//! let with_tip = two_nights + Money::from_paise(5050); // ₹3050.50
//! assert_eq!(with_tip.paise(), 305_050);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::GstRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 of a rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences such as `total - paid` may go negative
///   during validation, so the type allows it
/// - **Single field tuple struct**: zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use innkeeper_core::money::Money;
    ///
    /// let gst = Money::from_paise(18_050); // ₹180.50
    /// assert_eq!(gst.paise(), 18_050);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Creates a Money value from rupees and paise.
    ///
    /// ## Note
    /// For negative amounts, only the rupee part should be negative.
    /// `from_major_minor(-5, 50)` = -₹5.50, not -₹4.50
    #[inline]
    pub const fn from_major_minor(rupees: i64, paise: i64) -> Self {
        if rupees < 0 {
            Money(rupees * 100 - paise)
        } else {
            Money(rupees * 100 + paise)
        }
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    ///
    /// ## Example
    /// ```rust
    /// use innkeeper_core::money::Money;
    ///
    /// let refund = Money::from_rupees(1000) - Money::from_rupees(1500);
    /// assert_eq!(refund.non_negative(), Money::zero());
    /// ```
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// Calculates GST on this amount, rounding half-up to the paisa.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, widened to i128
    ///
    /// ## Example
    /// ```rust
    /// use innkeeper_core::money::Money;
    /// use innkeeper_core::types::GstRate;
    ///
    /// let base = Money::from_rupees(1000);
    /// let gst = base.calculate_gst(GstRate::from_percentage(18.0));
    /// assert_eq!(gst, Money::from_rupees(180));
    /// ```
    pub fn calculate_gst(&self, rate: GstRate) -> Money {
        let gst = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_paise(gst as i64)
    }

    /// Multiplies a daily rate by a number of days.
    #[inline]
    pub const fn multiply_days(&self, days: u32) -> Self {
        Money(self.0 * days as i64)
    }

    /// Scales this amount by `numerator / denominator`, rounding half-up.
    ///
    /// Used to trim one component of a split payment while keeping its
    /// share of the whole. Returns zero when `denominator` is not positive.
    ///
    /// ## Example
    /// ```rust
    /// use innkeeper_core::money::Money;
    ///
    /// // ₹300 of a ₹1000 payment, trimmed so the payment becomes ₹500
    /// let qr = Money::from_rupees(300);
    /// let trimmed = qr.scale(Money::from_rupees(500), Money::from_rupees(1000));
    /// assert_eq!(trimmed, Money::from_rupees(150));
    /// ```
    pub fn scale(&self, numerator: Money, denominator: Money) -> Money {
        if denominator.0 <= 0 {
            return Money::zero();
        }
        let scaled =
            (self.0 as i128 * numerator.0 as i128 * 2 + denominator.0 as i128) / (denominator.0 as i128 * 2);
        Money::from_paise(scaled as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows rupees with two decimals.
///
/// ## Note
/// Debugging and log output only. The dashboard does its own en-IN
/// formatting (lakh grouping).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a count (nights, rooms).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
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
    fn test_from_paise_and_parts() {
        let money = Money::from_paise(118_050);
        assert_eq!(money.paise(), 118_050);
        assert_eq!(money.rupees(), 1180);
        assert_eq!(money.paise_part(), 50);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).paise(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).paise(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_paise(118_000).to_string(), "₹1180.00");
        assert_eq!(Money::from_paise(5).to_string(), "₹0.05");
        assert_eq!(Money::from_paise(-550).to_string(), "-₹5.50");
    }

    #[test]
    fn test_gst_at_eighteen_percent() {
        let base = Money::from_rupees(1000);
        let gst = base.calculate_gst(GstRate::from_bps(1800));
        assert_eq!(gst.paise(), 18_000);
    }

    #[test]
    fn test_gst_rounds_half_up_to_the_paisa() {
        // ₹333.33 at 18% = ₹59.9994 → ₹60.00
        let gst = Money::from_paise(33_333).calculate_gst(GstRate::from_bps(1800));
        assert_eq!(gst.paise(), 6000);

        // ₹0.25 at 12% = 3 paise exactly
        let gst = Money::from_paise(25).calculate_gst(GstRate::from_bps(1200));
        assert_eq!(gst.paise(), 3);
    }

    #[test]
    fn test_multiply_days() {
        assert_eq!(Money::from_rupees(500).multiply_days(2), Money::from_rupees(1000));
        assert_eq!(Money::from_rupees(500).multiply_days(0), Money::zero());
    }

    #[test]
    fn test_scale_rounds_to_nearest() {
        // 1 paisa of 3, scaled to 2/3 → 0.666 → 1
        let scaled = Money::from_paise(1).scale(Money::from_paise(2), Money::from_paise(3));
        assert_eq!(scaled.paise(), 1);

        let scaled = Money::from_rupees(100).scale(Money::zero(), Money::from_rupees(50));
        assert!(scaled.is_zero());

        let scaled = Money::from_rupees(100).scale(Money::from_rupees(1), Money::zero());
        assert!(scaled.is_zero());
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(Money::from_paise(-1).non_negative(), Money::zero());
        assert_eq!(Money::from_paise(7).non_negative(), Money::from_paise(7));
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::from_rupees(1), Money::from_rupees(2), Money::from_paise(50)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.paise(), 350);
    }
}
