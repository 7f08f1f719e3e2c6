//! # Reports
//!
//! Read-only summaries over bookings and rooms: revenue for a period and the
//! housekeeping board. Nothing here writes; the db crate loads the rows and
//! hands them over.
//!
//! ## Period Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  In period:   check_in_date between start and end (inclusive)           │
//! │                                                                         │
//! │  Revenue:     amount_paid of every booking that was not cancelled       │
//! │             + the part of a cancelled booking's payment kept as charge  │
//! │                                                                         │
//! │  Occupancy:   nights of checked-in/checked-out stays that check in      │
//! │               during the period, cut off at the period's end            │
//! │               (a stay begun earlier counts toward its own period)       │
//! │               ÷ (rooms excluding dormitories × days in period)          │
//! │               capped at 100%                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Booking, BookingStatus, Guest, Room, RoomStatus};

// =============================================================================
// Period Summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct PeriodSummary {
    /// "March 2026", or "2026-03-01 - 2026-03-15" for custom ranges.
    pub label: String,
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,

    pub total_bookings: usize,
    pub reserved: usize,
    pub checked_in: usize,
    pub checked_out: usize,
    pub cancelled: usize,

    /// Money actually kept: payments on live bookings plus retained
    /// cancellation charges.
    pub revenue: Money,
    pub base_total: Money,
    pub gst_total: Money,
    pub cash_total: Money,
    pub qr_total: Money,
    pub extension_total: Money,
    pub refunds: Money,
    pub outstanding: Money,

    pub occupied_room_nights: i64,
    pub available_room_nights: i64,
    /// Percentage, 0.0 to 100.0.
    pub occupancy_rate: f64,
}

/// Summarizes the bookings whose check-in falls in `start..=end`.
///
/// `bookings` may include rows outside the period; they are ignored.
/// `rooms` is the whole inventory; dormitories are dropped here.
pub fn summarize(
    label: impl Into<String>,
    start: NaiveDate,
    end: NaiveDate,
    bookings: &[Booking],
    rooms: &[Room],
) -> PeriodSummary {
    let mut summary = PeriodSummary {
        label: label.into(),
        start,
        end,
        total_bookings: 0,
        reserved: 0,
        checked_in: 0,
        checked_out: 0,
        cancelled: 0,
        revenue: Money::zero(),
        base_total: Money::zero(),
        gst_total: Money::zero(),
        cash_total: Money::zero(),
        qr_total: Money::zero(),
        extension_total: Money::zero(),
        refunds: Money::zero(),
        outstanding: Money::zero(),
        occupied_room_nights: 0,
        available_room_nights: 0,
        occupancy_rate: 0.0,
    };

    let period_end = end + Duration::days(1);

    for booking in bookings
        .iter()
        .filter(|b| b.check_in_date >= start && b.check_in_date <= end)
    {
        summary.total_bookings += 1;

        if booking.status == BookingStatus::Cancelled {
            summary.cancelled += 1;
            let kept = booking.amount_paid() - booking.refund_amount().unwrap_or_default();
            summary.revenue += kept.non_negative();
            summary.refunds += booking.refund_amount().unwrap_or_default();
            continue;
        }

        match booking.status {
            BookingStatus::Reserved => summary.reserved += 1,
            BookingStatus::CheckedIn => summary.checked_in += 1,
            _ => summary.checked_out += 1,
        }

        summary.revenue += booking.amount_paid();
        summary.base_total += booking.base_amount();
        summary.gst_total += booking.gst_amount();
        summary.cash_total += booking.cash_amount();
        summary.qr_total += booking.qr_amount();
        summary.extension_total += booking.extended_amount();
        summary.outstanding += booking.outstanding();

        if booking.status != BookingStatus::Reserved {
            let stay_end = booking.expected_check_out_date().max(booking.check_in_date + Duration::days(1));
            let nights = (stay_end.min(period_end) - booking.check_in_date).num_days();
            summary.occupied_room_nights += nights.max(0);
        }
    }

    let rentable = rooms
        .iter()
        .filter(|r| r.room_type.counts_toward_occupancy())
        .count()
        .max(1) as i64;
    let days = (period_end - start).num_days().max(1);
    summary.available_room_nights = rentable * days;
    summary.occupancy_rate = (summary.occupied_room_nights as f64 * 100.0
        / summary.available_room_nights as f64)
        .min(100.0);

    summary
}

/// First and last day of a month, `None` for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next.pred_opt()?))
}

/// "March 2026".
pub fn month_label(start: NaiveDate) -> String {
    start.format("%B %Y").to_string()
}

/// Mean occupancy across summaries, for the yearly view.
pub fn average_occupancy(summaries: &[PeriodSummary]) -> f64 {
    if summaries.is_empty() {
        return 0.0;
    }
    summaries.iter().map(|s| s.occupancy_rate).sum::<f64>() / summaries.len() as f64
}

// =============================================================================
// Housekeeping Board
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct RoomCard {
    pub room: Room,
    /// Current stay for occupied rooms, last departure for rooms in cleaning.
    pub booking: Option<Booking>,
    pub guest: Option<Guest>,
    #[ts(as = "Option<String>")]
    pub checkout_time: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct HousekeepingBoard {
    pub occupied: Vec<RoomCard>,
    pub cleaning: Vec<RoomCard>,
    pub available: Vec<RoomCard>,
    pub maintenance: Vec<RoomCard>,
}

impl HousekeepingBoard {
    /// Groups rooms by status.
    ///
    /// `bookings` must be ordered newest first so the most recent stay of a
    /// room wins.
    pub fn build(rooms: Vec<Room>, bookings: &[Booking], guests: &HashMap<String, Guest>) -> Self {
        let mut board = HousekeepingBoard::default();

        for room in rooms {
            let wanted = match room.status {
                RoomStatus::Occupied => Some(BookingStatus::CheckedIn),
                RoomStatus::Cleaning => Some(BookingStatus::CheckedOut),
                _ => None,
            };
            let booking = wanted.and_then(|status| {
                bookings
                    .iter()
                    .find(|b| b.room_id == room.id && b.status == status)
                    .cloned()
            });
            let guest = booking.as_ref().and_then(|b| guests.get(&b.guest_id).cloned());
            let checkout_time = booking
                .as_ref()
                .filter(|b| b.status == BookingStatus::CheckedOut)
                .and_then(|b| b.actual_check_out_time);

            let status = room.status;
            let card = RoomCard {
                room,
                booking,
                guest,
                checkout_time,
            };
            match status {
                RoomStatus::Occupied => board.occupied.push(card),
                RoomStatus::Cleaning => board.cleaning.push(card),
                RoomStatus::Available => board.available.push(card),
                RoomStatus::Maintenance => board.maintenance.push(card),
            }
        }

        board
    }

    pub fn total_rooms(&self) -> usize {
        self.occupied.len() + self.cleaning.len() + self.available.len() + self.maintenance.len()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
