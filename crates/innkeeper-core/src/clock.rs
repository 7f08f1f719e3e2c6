//! # Clock
//!
//! Source of "now" for every date-sensitive rule (advance vs same-day,
//! confirm-not-before-check-in, checkout stamping, the noon cutoff).
//!
//! Times carry the front desk's local offset: the noon cutoff and "today"
//! are local notions, not UTC ones.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use std::sync::Mutex;

/// Provides the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    /// Today's billing date in local time.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// The host's wall clock in its configured local offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = Local::now();
        now.with_timezone(now.offset())
    }
}

/// A clock that only moves when told to. Used by tests.
///
/// ## Example
/// ```rust
/// use chrono::{DateTime, Duration};
/// use innkeeper_core::{Clock, FixedClock};
///
/// let clock = FixedClock::new(DateTime::parse_from_rfc3339("2026-03-10T14:00:00+05:30").unwrap());
/// clock.advance(Duration::days(1));
/// assert_eq!(clock.today().to_string(), "2026-03-11");
/// ```
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        FixedClock { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_uses_local_offset() {
        // 20:00 UTC on the 10th is already the 11th in India
        let utc_evening = DateTime::parse_from_rfc3339("2026-03-10T20:00:00+00:00").unwrap();
        let ist = utc_evening.with_timezone(&FixedOffset::east_opt(19_800).unwrap());
        let clock = FixedClock::new(ist);

        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 11).unwrap());
        assert_eq!(clock.now_utc(), utc_evening.with_timezone(&Utc));
    }

    #[test]
    fn test_set_replaces_time() {
        let clock = FixedClock::new(DateTime::parse_from_rfc3339("2026-03-10T09:00:00+05:30").unwrap());
        clock.set(DateTime::parse_from_rfc3339("2026-04-01T09:00:00+05:30").unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
    }
}
