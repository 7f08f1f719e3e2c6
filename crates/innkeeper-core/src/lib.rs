//! # innkeeper-core: Pure Business Logic for Innkeeper
//!
//! This crate holds every rule of the front desk as pure, deterministic code
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Innkeeper Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Front-desk dashboard (browser)                  │   │
//! │  │   Check-in ──► Payments ──► Extend ──► Check-out ──► Cleaning   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            innkeeper-db (BookingLedger + repositories)          │   │
//! │  │     one SQLite transaction per booking/room transition          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ innkeeper-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │ billing │ │ booking │ │  room   │ │ payment │ │ report  │  │   │
//! │  │   │ nights  │ │ states  │ │ states  │ │  split  │ │ totals  │  │   │
//! │  │   │  GST    │ │ money   │ │  audit  │ │  trim   │ │occupancy│  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO SYSTEM CLOCK • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type in integer paise
//! - [`billing`] - Noon-cutoff billing dates, nights and GST
//! - [`types`] - Domain entities (Room, Guest, Booking, RoomStatusLog)
//! - [`booking`] - Booking state machine and money mutations
//! - [`room`] - Room state machine and audit entries
//! - [`payment`] - Cash/QR split reconciliation
//! - [`guest`] - Guest input validation
//! - [`report`] - Revenue and housekeeping summaries
//! - [`clock`] - Injectable source of "now"
//! - [`error`] - Domain error types
//! - [`validation`] - Field validators
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use innkeeper_core::billing::{nights_billed, quote};
//! use innkeeper_core::{GstRate, Money};
//!
//! let check_in = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
//! let check_out = NaiveDate::from_ymd_opt(2026, 3, 13).unwrap();
//! let nights = nights_billed(check_in, check_out, None);
//! assert_eq!(nights, 3);
//!
//! let charge = quote(Money::from_rupees(1500), nights, GstRate::from_bps(1200));
//! assert_eq!(charge.total.paise(), 504_000); // ₹4500 + ₹540 GST
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod booking;
pub mod clock;
pub mod error;
pub mod guest;
pub mod money;
pub mod payment;
pub mod report;
pub mod room;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use booking::{
    BookingEvent, BookingRevision, Cancellation, Extension, ExtensionCharge, ExtensionOutcome, NewBooking,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use payment::{PaymentMethod, PaymentSplit};
pub use room::{NewRoom, RoomEvent, RoomUpdate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// GST rate used when the settings store has no usable `gst_rate` value.
pub const DEFAULT_GST_RATE_PERCENT: f64 = 18.0;

/// Local hour at which a billing day rolls over.
pub const BILLING_CUTOFF_HOUR: u32 = 12;

/// Upper bound on a room's configured occupancy.
pub const MAX_ROOM_OCCUPANCY: i64 = 20;

/// Upper bound on a single extension request.
pub const MAX_EXTENSION_DAYS: u32 = 365;
