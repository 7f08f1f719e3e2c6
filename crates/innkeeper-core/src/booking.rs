//! # Booking State Machine
//!
//! Every change to a booking goes through a method in this module. Each
//! method checks the status table first, validates its input, and only then
//! touches the booking, so a returned error means the booking is unchanged.
//!
//! ## Transition Table
//! ```text
//! ┌──────────┬──────────────────────┬──────────────┐
//! │ Event    │ From                 │ To           │
//! ├──────────┼──────────────────────┼──────────────┤
//! │ Confirm  │ reserved             │ checked_in   │
//! │ Revise   │ reserved             │ reserved     │
//! │ Cancel   │ reserved             │ cancelled    │
//! │ CheckOut │ checked_in           │ checked_out  │
//! │ Extend   │ checked_in           │ checked_in   │
//! │ Pay      │ reserved, checked_in │ (unchanged)  │
//! └──────────┴──────────────────────┴──────────────┘
//! ```
//!
//! Room side effects are the ledger's job; this module only checks the room
//! where a booking rule depends on it (capacity, availability).

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::billing::{quote, Charge};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::payment::{PaymentMethod, PaymentSplit};
use crate::types::{Booking, BookingStatus, GstRate, Room};
use crate::validation::{
    validate_extension_days, validate_gst_rate, validate_gstin, validate_non_negative,
    validate_stay_dates,
};

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    Confirm,
    Revise,
    Cancel,
    CheckOut,
    Extend,
    Pay,
}

impl BookingEvent {
    pub const fn action(&self) -> &'static str {
        match self {
            BookingEvent::Confirm => "confirm",
            BookingEvent::Revise => "edit",
            BookingEvent::Cancel => "cancel",
            BookingEvent::CheckOut => "check out",
            BookingEvent::Extend => "extend",
            BookingEvent::Pay => "take payment",
        }
    }
}

impl BookingStatus {
    /// Applies an event, returning the next status if the table allows it.
    pub fn apply(self, event: BookingEvent) -> Option<BookingStatus> {
        use BookingEvent::*;
        use BookingStatus::*;

        match (self, event) {
            (Reserved, Confirm) => Some(CheckedIn),
            (Reserved, Revise) => Some(Reserved),
            (Reserved, Cancel) => Some(Cancelled),
            (CheckedIn, CheckOut) => Some(CheckedOut),
            (CheckedIn, Extend) => Some(CheckedIn),
            (Reserved | CheckedIn, Pay) => Some(self),
            _ => None,
        }
    }
}

// =============================================================================
// Inputs and Outcomes
// =============================================================================

/// Input for creating a booking.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBooking {
    pub room_id: String,
    pub guest_id: String,
    #[ts(as = "String")]
    pub check_in_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub check_out_date: Option<NaiveDate>,
    pub number_of_guests: i64,
    pub base_amount: Money,
    /// Defaults to the configured GST rate.
    pub gst_rate: Option<GstRate>,
    /// Paid at the desk when the booking is made.
    pub payment: PaymentSplit,
    pub gstin: Option<String>,
    /// `Some(true)` reserves even for today; `None` decides by date.
    pub is_advance_booking: Option<bool>,
}

/// Edits to a reservation; `None` leaves a field as is.
///
/// `payment`, when given, replaces the advance already recorded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookingRevision {
    pub room_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub check_in_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub check_out_date: Option<NaiveDate>,
    pub number_of_guests: Option<i64>,
    pub base_amount: Option<Money>,
    pub gst_rate: Option<GstRate>,
    pub payment: Option<PaymentSplit>,
    pub gstin: Option<String>,
}

/// Extra nights for a checked-in stay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Extension {
    pub additional_days: u32,
    pub daily_rate: Money,
    pub gst_rate: GstRate,
    /// Collected with the extension; may be partial or zero.
    pub payment: PaymentSplit,
}

/// What an extension added to the bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExtensionCharge {
    pub additional_days: u32,
    pub base: Money,
    pub gst: Money,
    pub total: Money,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ExtensionOutcome {
    pub booking: Booking,
    pub charge: ExtensionCharge,
}

/// A cancelled reservation and the amount to hand back.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct Cancellation {
    pub booking: Booking,
    pub refund: Money,
}

// =============================================================================
// Creation
// =============================================================================

impl NewBooking {
    /// Validates the input against `room` and builds the booking.
    ///
    /// ## Status Decision
    /// - check-in after today, or flagged advance → `reserved`
    /// - otherwise → `checked_in`, which needs the room available
    pub fn into_booking(
        self,
        room: &Room,
        default_rate: GstRate,
        now: DateTime<FixedOffset>,
    ) -> CoreResult<Booking> {
        let today = now.date_naive();
        let is_future = self.check_in_date > today;

        if self.is_advance_booking == Some(false) && is_future {
            return Err(ValidationError::InvalidFormat {
                field: "check_in_date".to_string(),
                reason: "a future check-in must be an advance booking".to_string(),
            }
            .into());
        }
        let advance = is_future || self.is_advance_booking == Some(true);

        validate_stay_dates(self.check_in_date, self.check_out_date)?;
        check_party_size(room, self.number_of_guests)?;
        validate_non_negative("base_amount", self.base_amount)?;
        let rate = self.gst_rate.unwrap_or(default_rate);
        validate_gst_rate(rate)?;
        self.payment.validate()?;
        let gstin = self
            .gstin
            .as_deref()
            .filter(|g| !g.trim().is_empty())
            .map(validate_gstin)
            .transpose()?;

        let charge = Charge::from_base(self.base_amount, rate);
        if self.payment.total() > charge.total {
            return Err(CoreError::PaymentExceedsDue {
                due: charge.total,
                requested: self.payment.total(),
            });
        }

        if !advance {
            room.ensure_available()?;
        }

        let created = now.with_timezone(&Utc);
        Ok(Booking {
            id: Uuid::new_v4().to_string(),
            room_id: room.id.clone(),
            guest_id: self.guest_id,
            check_in_date: self.check_in_date,
            check_out_date: self.check_out_date,
            actual_check_in_time: if advance { None } else { Some(now) },
            actual_check_out_time: None,
            number_of_guests: self.number_of_guests,
            base_amount_paise: charge.base.paise(),
            gst_rate_bps: rate.bps(),
            gst_amount_paise: charge.gst.paise(),
            total_amount_paise: charge.total.paise(),
            amount_paid_paise: self.payment.total().paise(),
            qr_amount_paise: self.payment.qr.paise(),
            cash_amount_paise: self.payment.cash.paise(),
            payment_method: PaymentMethod::from_amounts(self.payment.qr, self.payment.cash),
            extended_amount_paise: 0,
            cancellation_charge_paise: None,
            refund_amount_paise: None,
            cancelled_at: None,
            gstin,
            status: if advance {
                BookingStatus::Reserved
            } else {
                BookingStatus::CheckedIn
            },
            version: 1,
            created_at: created,
            updated_at: created,
        })
    }
}

fn check_party_size(room: &Room, guests: i64) -> CoreResult<()> {
    if guests < 1 {
        return Err(ValidationError::MustBePositive {
            field: "number_of_guests".to_string(),
        }
        .into());
    }
    if guests > room.max_occupancy {
        return Err(CoreError::OccupancyExceeded {
            room_number: room.room_number.clone(),
            max: room.max_occupancy,
            requested: guests,
        });
    }
    Ok(())
}

// =============================================================================
// Transitions
// =============================================================================

impl Booking {
    /// Looks up the next status, without changing anything.
    fn next_status(&self, event: BookingEvent) -> CoreResult<BookingStatus> {
        self.status
            .apply(event)
            .ok_or_else(|| CoreError::InvalidBookingTransition {
                booking_id: self.id.clone(),
                status: self.status,
                action: event.action(),
            })
    }

    /// Guest arrived for an advance booking.
    pub fn confirm(&mut self, now: DateTime<FixedOffset>) -> CoreResult<()> {
        let next = self.next_status(BookingEvent::Confirm)?;

        if self.check_in_date > now.date_naive() {
            return Err(CoreError::CheckInDateNotReached {
                booking_id: self.id.clone(),
                check_in_date: self.check_in_date,
            });
        }

        self.status = next;
        self.actual_check_in_time = Some(now);
        Ok(())
    }

    /// Edits a reservation in place. `room` is the room the booking will
    /// hold afterwards (the new one when the revision moves it).
    pub fn revise(&mut self, revision: BookingRevision, room: &Room) -> CoreResult<()> {
        self.next_status(BookingEvent::Revise)?;

        if room.id != self.room_id {
            room.ensure_reservable()?;
        }

        let check_in = revision.check_in_date.unwrap_or(self.check_in_date);
        let check_out = revision.check_out_date.or(self.check_out_date);
        validate_stay_dates(check_in, check_out)?;

        let guests = revision.number_of_guests.unwrap_or(self.number_of_guests);
        check_party_size(room, guests)?;

        let base = revision.base_amount.unwrap_or(self.base_amount());
        validate_non_negative("base_amount", base)?;
        let rate = revision.gst_rate.unwrap_or(self.gst_rate());
        validate_gst_rate(rate)?;
        let charge = Charge::from_base(base, rate);

        let payment = revision
            .payment
            .unwrap_or_else(|| PaymentSplit::new(self.cash_amount(), self.qr_amount()));
        payment.validate()?;
        if payment.total() > charge.total {
            return Err(CoreError::PaymentExceedsDue {
                due: charge.total,
                requested: payment.total(),
            });
        }

        let gstin = match revision.gstin {
            Some(gstin) if gstin.trim().is_empty() => None,
            Some(gstin) => Some(validate_gstin(&gstin)?),
            None => self.gstin.take(),
        };

        self.room_id = room.id.clone();
        self.check_in_date = check_in;
        self.check_out_date = check_out;
        self.number_of_guests = guests;
        self.base_amount_paise = charge.base.paise();
        self.gst_rate_bps = rate.bps();
        self.gst_amount_paise = charge.gst.paise();
        self.total_amount_paise = charge.total.paise();
        self.amount_paid_paise = payment.total().paise();
        self.qr_amount_paise = payment.qr.paise();
        self.cash_amount_paise = payment.cash.paise();
        self.payment_method = PaymentMethod::from_amounts(payment.qr, payment.cash);
        self.gstin = gstin;
        Ok(())
    }

    /// Cancels a reservation, keeping `charge` of what was paid.
    ///
    /// Returns the refund: `max(0, paid - charge)`.
    ///
    /// ## Example
    /// ```text
    /// paid ₹1000, charge ₹300  → refund ₹700
    /// paid ₹1000, charge ₹1500 → refund ₹0
    /// ```
    pub fn cancel(&mut self, charge: Money, now: DateTime<Utc>) -> CoreResult<Money> {
        let next = self.next_status(BookingEvent::Cancel)?;
        validate_non_negative("cancellation_charge", charge)?;

        let refund = (self.amount_paid() - charge).non_negative();

        self.status = next;
        self.cancellation_charge_paise = Some(charge.paise());
        self.refund_amount_paise = Some(refund.paise());
        self.cancelled_at = Some(now);
        Ok(refund)
    }

    /// Ends the stay: departure is stamped from `now`.
    pub fn check_out(&mut self, now: DateTime<FixedOffset>) -> CoreResult<()> {
        let next = self.next_status(BookingEvent::CheckOut)?;

        self.status = next;
        self.check_out_date = Some(now.date_naive());
        self.actual_check_out_time = Some(now);
        Ok(())
    }

    /// Adds nights to a checked-in stay and records any payment taken.
    pub fn extend(&mut self, extension: &Extension) -> CoreResult<ExtensionCharge> {
        self.next_status(BookingEvent::Extend)?;

        let check_out = self
            .check_out_date
            .ok_or_else(|| CoreError::MissingCheckoutDate(self.id.clone()))?;
        validate_extension_days(extension.additional_days)?;
        validate_non_negative("daily_rate", extension.daily_rate)?;
        validate_gst_rate(extension.gst_rate)?;
        extension.payment.validate()?;

        let charge = quote(extension.daily_rate, extension.additional_days, extension.gst_rate);
        let due = self.outstanding() + charge.total;
        if extension.payment.total() > due {
            return Err(CoreError::PaymentExceedsDue {
                due,
                requested: extension.payment.total(),
            });
        }

        self.base_amount_paise += charge.base.paise();
        self.gst_amount_paise += charge.gst.paise();
        self.total_amount_paise += charge.total.paise();
        self.extended_amount_paise += charge.total.paise();
        self.check_out_date = Some(check_out + Duration::days(extension.additional_days as i64));
        self.record_payment(extension.payment);

        Ok(ExtensionCharge {
            additional_days: extension.additional_days,
            base: charge.base,
            gst: charge.gst,
            total: charge.total,
        })
    }

    /// Takes a payment against the outstanding balance.
    ///
    /// A split larger than the balance is trimmed proportionally so the
    /// booking ends up exactly paid. Returns the split actually recorded.
    pub fn add_payment(&mut self, split: PaymentSplit) -> CoreResult<PaymentSplit> {
        self.next_status(BookingEvent::Pay)?;
        split.validate()?;

        if split.is_zero() {
            return Err(ValidationError::MustBePositive {
                field: "payment".to_string(),
            }
            .into());
        }

        let outstanding = self.outstanding();
        if !outstanding.is_positive() {
            return Err(CoreError::NothingOutstanding(self.id.clone()));
        }

        let applied = split.trim_to(outstanding);
        self.record_payment(applied);
        Ok(applied)
    }

    fn record_payment(&mut self, split: PaymentSplit) {
        self.amount_paid_paise += split.total().paise();
        self.qr_amount_paise += split.qr.paise();
        self.cash_amount_paise += split.cash.paise();
        self.payment_method = PaymentMethod::from_amounts(self.qr_amount(), self.cash_amount());
    }

    /// Verifies the money fields still add up.
    pub fn check_invariants(&self) -> CoreResult<()> {
        let fail = |reason| {
            Err(CoreError::Inconsistent {
                booking_id: self.id.clone(),
                reason,
            })
        };

        if self.qr_amount() + self.cash_amount() != self.amount_paid() {
            return fail("qr and cash do not sum to amount paid");
        }
        if self.amount_paid() > self.total_amount() {
            return fail("amount paid exceeds total");
        }
        if self.base_amount() + self.gst_amount() != self.total_amount() {
            return fail("base and gst do not sum to total");
        }
        if self.qr_amount().is_negative() || self.cash_amount().is_negative() {
            return fail("negative payment component");
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
