//! # Domain Types
//!
//! Core domain types used throughout Innkeeper.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Room       │   │     Booking     │   │      Guest      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  room_id (FK)   │──►│  id (UUID)      │       │
//! │  │  room_number    │   │  guest_id (FK)  │   │  name, address  │       │
//! │  │  status         │   │  status         │   │  proof (pair)   │       │
//! │  │  version        │   │  *_paise money  │   └─────────────────┘       │
//! │  └────────┬────────┘   │  version        │                             │
//! │           │            └────────┬────────┘                             │
//! │           │                     │                                       │
//! │           ▼                     ▼                                       │
//! │  ┌───────────────────────────────────────┐                             │
//! │  │        RoomStatusLog (append-only)    │                             │
//! │  │  room_id, booking_id?, status, notes  │                             │
//! │  └───────────────────────────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Storage Conventions
//! - Money columns are integer paise, suffixed `_paise`
//! - GST rate is basis points, suffixed `_bps` (1800 = 18%)
//! - `version` increments on every write (optimistic concurrency)

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::billing;
use crate::money::Money;
use crate::payment::PaymentMethod;

// =============================================================================
// GST Rate
// =============================================================================

/// GST rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% (the common hotel slab), 1200 bps = 12%
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GstRate(u32);

impl GstRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        GstRate(bps)
    }

    /// Creates a rate from a percentage, e.g. the settings value `"18"`.
    ///
    /// Negative and non-finite inputs collapse to zero.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return GstRate(0);
        }
        GstRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        GstRate(0)
    }
}

impl Default for GstRate {
    fn default() -> Self {
        GstRate::from_percentage(crate::DEFAULT_GST_RATE_PERCENT)
    }
}

// =============================================================================
// Room
// =============================================================================

/// Which part of the property a room is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Floor {
    Ground,
    First,
    Cottage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Standard,
    Deluxe,
    Cottage,
    Dormitory,
}

impl RoomType {
    /// Dormitories are sold per bed and stay out of occupancy statistics.
    pub const fn counts_toward_occupancy(&self) -> bool {
        !matches!(self, RoomType::Dormitory)
    }
}

/// Housekeeping status of a room.
///
/// Transitions are defined in [`crate::room`]; nothing else may change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Occupied,
    Cleaning,
    Maintenance,
}

impl RoomStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Cleaning => "cleaning",
            RoomStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for RoomStatus {
    fn default() -> Self {
        RoomStatus::Available
    }
}

/// A sellable room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Room {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display key shown on the dashboard ("101", "C2").
    pub room_number: String,

    pub floor: Floor,

    pub room_type: RoomType,

    /// Maximum number of guests per booking.
    pub max_occupancy: i64,

    pub status: RoomStatus,

    /// Incremented on every write.
    pub version: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Guest
// =============================================================================

/// Kind of identity document a guest presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProofType {
    Aadhar,
    Pan,
    DrivingLicense,
}

/// A guest identity record.
///
/// Never deleted once referenced by a booking: refund and dispute history
/// depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Guest {
    pub id: String,
    pub name: String,
    pub address: String,
    /// Present together with `proof_number`, or both absent (an advance
    /// booking may defer proof to arrival).
    pub proof_type: Option<ProofType>,
    pub proof_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Guest {
    /// Checks if the guest has shown an identity document.
    pub fn has_proof(&self) -> bool {
        self.proof_type.is_some() && self.proof_number.is_some()
    }
}

// =============================================================================
// Booking Status
// =============================================================================

/// Lifecycle status of a booking.
///
/// ```text
///   reserved ──confirm──► checked_in ──check out──► checked_out
///      │                     │  ▲
///      │ cancel              └──┘ extend / pay
///      ▼
///   cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Advance booking, guest not yet on site.
    Reserved,
    /// Guest occupies the room.
    CheckedIn,
    /// Stay concluded.
    CheckedOut,
    /// Advance booking released before arrival.
    Cancelled,
}

impl BookingStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Reserved => "reserved",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::CheckedOut => "checked_out",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal status.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::CheckedOut | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Booking
// =============================================================================

/// A reservation or stay of one guest party in one room.
///
/// ## Money Invariants
/// - `qr_amount_paise + cash_amount_paise == amount_paid_paise`
/// - `amount_paid_paise <= total_amount_paise`
/// - `total_amount_paise == base_amount_paise + gst_amount_paise`
///
/// Mutations live in [`crate::booking`] and keep all three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Booking {
    pub id: String,
    pub room_id: String,
    pub guest_id: String,

    /// Billing day; the stay counts from noon of this date.
    #[ts(as = "String")]
    pub check_in_date: NaiveDate,

    /// Billing day of departure, unknown for open-ended stays.
    #[ts(as = "Option<String>")]
    pub check_out_date: Option<NaiveDate>,

    /// Wall-clock arrival, informational.
    #[ts(as = "Option<String>")]
    pub actual_check_in_time: Option<DateTime<FixedOffset>>,

    /// Wall-clock departure; its local hour feeds the noon-cutoff rule.
    #[ts(as = "Option<String>")]
    pub actual_check_out_time: Option<DateTime<FixedOffset>>,

    pub number_of_guests: i64,

    pub base_amount_paise: i64,
    pub gst_rate_bps: u32,
    pub gst_amount_paise: i64,
    pub total_amount_paise: i64,

    pub amount_paid_paise: i64,
    pub qr_amount_paise: i64,
    pub cash_amount_paise: i64,
    pub payment_method: PaymentMethod,

    /// Cumulative total (base + GST) added by extensions.
    pub extended_amount_paise: i64,

    pub cancellation_charge_paise: Option<i64>,
    pub refund_amount_paise: Option<i64>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,

    /// Company GST number for business invoices.
    pub gstin: Option<String>,

    pub status: BookingStatus,

    pub version: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    #[inline]
    pub fn base_amount(&self) -> Money {
        Money::from_paise(self.base_amount_paise)
    }

    #[inline]
    pub fn gst_rate(&self) -> GstRate {
        GstRate::from_bps(self.gst_rate_bps)
    }

    #[inline]
    pub fn gst_amount(&self) -> Money {
        Money::from_paise(self.gst_amount_paise)
    }

    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_paise(self.total_amount_paise)
    }

    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_paise(self.amount_paid_paise)
    }

    #[inline]
    pub fn qr_amount(&self) -> Money {
        Money::from_paise(self.qr_amount_paise)
    }

    #[inline]
    pub fn cash_amount(&self) -> Money {
        Money::from_paise(self.cash_amount_paise)
    }

    #[inline]
    pub fn extended_amount(&self) -> Money {
        Money::from_paise(self.extended_amount_paise)
    }

    pub fn cancellation_charge(&self) -> Option<Money> {
        self.cancellation_charge_paise.map(Money::from_paise)
    }

    pub fn refund_amount(&self) -> Option<Money> {
        self.refund_amount_paise.map(Money::from_paise)
    }

    /// Amount still owed: `total - paid`.
    pub fn outstanding(&self) -> Money {
        self.total_amount() - self.amount_paid()
    }

    /// Departure day used for billing when none has been recorded yet.
    pub fn expected_check_out_date(&self) -> NaiveDate {
        self.check_out_date
            .unwrap_or_else(|| billing::default_checkout_date(self.check_in_date))
    }

    /// Nights billed under the noon-cutoff rule.
    pub fn nights_billed(&self) -> u32 {
        billing::nights_billed(
            self.check_in_date,
            self.expected_check_out_date(),
            self.actual_check_out_time.as_ref(),
        )
    }
}

// =============================================================================
// Room Status Log
// =============================================================================

/// One entry of the append-only room audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RoomStatusLog {
    pub id: String,
    pub room_id: String,
    /// Booking that caused the transition, if any.
    pub booking_id: Option<String>,
    /// Status the room moved to.
    pub status: RoomStatus,
    pub notes: Option<String>,
    /// Stamped on a `cleaning` entry when the room is marked clean.
    #[ts(as = "Option<String>")]
    pub cleaned_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
