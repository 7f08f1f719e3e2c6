//! # Payment Reconciliation
//!
//! Guests pay by cash, by UPI QR, or by both in one go. A booking keeps the
//! running totals of each so the night audit can match the cash drawer and
//! the bank statement separately.
//!
//! ## Reconciliation Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  qr_amount + cash_amount == amount_paid        (always, exactly)        │
//! │  amount_paid             <= total_amount       (never overpaid)         │
//! │                                                                         │
//! │  Overpayment at the desk:                                               │
//! │    outstanding ₹500, tendered cash ₹700 + QR ₹300 (₹1000)               │
//! │    → trimmed to QR ₹150 + cash ₹350, keeping the 70:30 ratio            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Payment Method
// =============================================================================

/// How a booking has been paid so far, derived from its running totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Qr,
    Mixed,
}

impl PaymentMethod {
    /// Mixed if both components are positive, QR if only QR is, else cash.
    ///
    /// ## Example
    /// ```rust
    /// use innkeeper_core::{Money, PaymentMethod};
    ///
    /// let method = PaymentMethod::from_amounts(Money::from_rupees(200), Money::zero());
    /// assert_eq!(method, PaymentMethod::Qr);
    /// ```
    pub fn from_amounts(qr: Money, cash: Money) -> Self {
        match (qr.is_positive(), cash.is_positive()) {
            (true, true) => PaymentMethod::Mixed,
            (true, false) => PaymentMethod::Qr,
            _ => PaymentMethod::Cash,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Qr => "qr",
            PaymentMethod::Mixed => "mixed",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Payment Split
// =============================================================================

/// One tender at the desk, split by channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentSplit {
    pub cash: Money,
    pub qr: Money,
}

impl PaymentSplit {
    pub const fn new(cash: Money, qr: Money) -> Self {
        PaymentSplit { cash, qr }
    }

    pub const fn cash(amount: Money) -> Self {
        PaymentSplit {
            cash: amount,
            qr: Money::zero(),
        }
    }

    pub const fn qr(amount: Money) -> Self {
        PaymentSplit {
            cash: Money::zero(),
            qr: amount,
        }
    }

    pub const fn none() -> Self {
        PaymentSplit {
            cash: Money::zero(),
            qr: Money::zero(),
        }
    }

    #[inline]
    pub fn total(&self) -> Money {
        self.cash + self.qr
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.cash.is_zero() && self.qr.is_zero()
    }

    /// Rejects negative components.
    pub fn validate(&self) -> CoreResult<()> {
        if self.cash.is_negative() {
            return Err(ValidationError::Negative {
                field: "cash_amount".to_string(),
            }
            .into());
        }
        if self.qr.is_negative() {
            return Err(ValidationError::Negative {
                field: "qr_amount".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Shrinks the split so its total is at most `limit`.
    ///
    /// The QR share is scaled by `limit / total` and rounded to the paisa;
    /// cash takes the remainder so the result sums to `limit` exactly.
    ///
    /// ## Example
    /// ```rust
    /// use innkeeper_core::{Money, PaymentSplit};
    ///
    /// let tendered = PaymentSplit::new(Money::from_rupees(700), Money::from_rupees(300));
    /// let trimmed = tendered.trim_to(Money::from_rupees(500));
    /// assert_eq!(trimmed.qr, Money::from_rupees(150));
    /// assert_eq!(trimmed.cash, Money::from_rupees(350));
    /// ```
    pub fn trim_to(&self, limit: Money) -> PaymentSplit {
        let total = self.total();
        if total <= limit {
            return *self;
        }
        let limit = limit.non_negative();
        let qr = self.qr.scale(limit, total);
        PaymentSplit {
            cash: limit - qr,
            qr,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
