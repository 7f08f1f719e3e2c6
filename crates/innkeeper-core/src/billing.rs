//! # Billing Engine
//!
//! Turns wall-clock arrival and departure into billable nights, and a daily
//! tariff into base, GST and total amounts.
//!
//! ## The Noon Cutoff
//! ```text
//!   day d              day d+1             day d+2
//!   ──┬──────────────────┬──────────────────┬──
//!    12:00             12:00              12:00
//!     │◄──── night 1 ───►│◄──── night 2 ───►│
//!     ▲                  ▲  ▲
//!   check-in        checkout before noon  = 1 night
//!                   checkout at/after noon = 2 nights
//! ```
//!
//! A booking's `check_in_date` and `check_out_date` are billing days (the
//! stay counts from noon of that day). Only the one-night case looks at the
//! checkout clock; longer stays bill the whole-day difference.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::GstRate;
use crate::BILLING_CUTOFF_HOUR;

// =============================================================================
// Billing Dates
// =============================================================================

/// Strips the time of day from an instant, in the instant's own offset.
///
/// ## Example
/// ```rust
/// use chrono::{DateTime, NaiveDate};
/// use innkeeper_core::billing::normalize_billing_date;
///
/// let late_arrival = DateTime::parse_from_rfc3339("2026-03-10T23:40:00+05:30").unwrap();
/// assert_eq!(
///     normalize_billing_date(&late_arrival),
///     NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
/// );
/// ```
pub fn normalize_billing_date<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    instant.date_naive()
}

/// The departure day assumed when none is recorded: the next day.
pub fn default_checkout_date(check_in: NaiveDate) -> NaiveDate {
    check_in + Duration::days(1)
}

/// Number of nights billed for a stay. Never less than 1.
///
/// `actual_check_out` only matters when the billing days are exactly one
/// apart: leaving at or after noon then costs a second night.
pub fn nights_billed(
    check_in: NaiveDate,
    check_out: NaiveDate,
    actual_check_out: Option<&DateTime<FixedOffset>>,
) -> u32 {
    let days = (check_out - check_in).num_days();

    if days == 1 {
        if let Some(departure) = actual_check_out {
            if departure.hour() >= BILLING_CUTOFF_HOUR {
                return 2;
            }
        }
    }

    days.max(1).min(u32::MAX as i64) as u32
}

// =============================================================================
// Amounts
// =============================================================================

/// GST on a base amount, rounded half-up to the paisa.
#[inline]
pub fn gst_amount(base: Money, rate: GstRate) -> Money {
    base.calculate_gst(rate)
}

#[inline]
pub fn total_amount(base: Money, gst: Money) -> Money {
    base + gst
}

/// A priced stay or extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Charge {
    pub base: Money,
    pub gst: Money,
    pub total: Money,
}

impl Charge {
    /// Prices an already-agreed base amount.
    pub fn from_base(base: Money, rate: GstRate) -> Self {
        let gst = gst_amount(base, rate);
        Charge {
            base,
            gst,
            total: total_amount(base, gst),
        }
    }
}

/// Prices `nights` at `daily_rate` plus GST.
///
/// ## Example
/// ```rust
/// use innkeeper_core::billing::quote;
/// use innkeeper_core::{GstRate, Money};
///
/// let charge = quote(Money::from_rupees(500), 2, GstRate::from_bps(1800));
/// assert_eq!(charge.base, Money::from_rupees(1000));
/// assert_eq!(charge.gst, Money::from_rupees(180));
/// assert_eq!(charge.total, Money::from_rupees(1180));
/// ```
pub fn quote(daily_rate: Money, nights: u32, rate: GstRate) -> Charge {
    Charge::from_base(daily_rate.multiply_days(nights), rate)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ist(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_one_night_checkout_before_noon() {
        let departure = ist("2026-03-11T11:59:00+05:30");
        assert_eq!(nights_billed(date(2026, 3, 10), date(2026, 3, 11), Some(&departure)), 1);
    }

    #[test]
    fn test_one_night_checkout_at_noon_bills_two() {
        let departure = ist("2026-03-11T12:00:00+05:30");
        assert_eq!(nights_billed(date(2026, 3, 10), date(2026, 3, 11), Some(&departure)), 2);
    }

    #[test]
    fn test_cutoff_uses_local_hour() {
        // 06:30 UTC is noon in India
        let departure = ist("2026-03-11T06:30:00+00:00").with_timezone(&FixedOffset::east_opt(19_800).unwrap());
        assert_eq!(nights_billed(date(2026, 3, 10), date(2026, 3, 11), Some(&departure)), 2);
    }

    #[test]
    fn test_multi_night_ignores_checkout_time() {
        let departure = ist("2026-03-13T18:00:00+05:30");
        assert_eq!(nights_billed(date(2026, 3, 10), date(2026, 3, 13), None), 3);
        assert_eq!(nights_billed(date(2026, 3, 10), date(2026, 3, 13), Some(&departure)), 3);
    }

    #[test]
    fn test_minimum_one_night() {
        assert_eq!(nights_billed(date(2026, 3, 10), date(2026, 3, 10), None), 1);
        assert_eq!(nights_billed(date(2026, 3, 10), date(2026, 3, 8), None), 1);
    }

    #[test]
    fn test_default_checkout_crosses_month() {
        assert_eq!(default_checkout_date(date(2026, 1, 31)), date(2026, 2, 1));
    }

    #[test]
    fn test_charge_from_base() {
        let charge = Charge::from_base(Money::from_paise(99_999), GstRate::from_bps(1200));
        assert_eq!(charge.gst.paise(), 12_000);
        assert_eq!(charge.total.paise(), 111_999);
    }
}
