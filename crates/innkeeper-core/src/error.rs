//! # Error Types
//!
//! Domain-specific error types for innkeeper-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  innkeeper-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule and state violations             │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  innkeeper-db errors (separate crate)                                  │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── LedgerError      - What callers of the ledger see                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError ← DbError             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant renders a message fit to show front-desk staff as-is.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{BookingStatus, RoomStatus};

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse category of a failure, for callers that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Input rejected before any state was touched.
    Validation,
    /// The entity is not in a state that allows the operation.
    StateViolation,
    /// A referenced booking, room or guest does not exist.
    NotFound,
    /// The caller acted on a stale copy of the entity.
    Conflict,
    /// The storage layer failed.
    Storage,
}

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the booking and room state machines.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Guest not found: {0}")]
    GuestNotFound(String),

    /// The booking's status has no edge for the requested action.
    ///
    /// ## When This Occurs
    /// - Checking out a reserved or cancelled booking
    /// - Editing or cancelling a booking that is no longer reserved
    /// - Extending a booking that already checked out
    #[error("Booking {booking_id} is {status}, cannot {action}")]
    InvalidBookingTransition {
        booking_id: String,
        status: BookingStatus,
        action: &'static str,
    },

    /// The room's status has no edge for the requested event.
    #[error("Room {room_number} is {status}, cannot {action}")]
    InvalidRoomTransition {
        room_number: String,
        status: RoomStatus,
        action: &'static str,
    },

    /// An advance booking was confirmed before its billing day.
    #[error("Cannot confirm advance booking {booking_id} before its check-in date {check_in_date}")]
    CheckInDateNotReached {
        booking_id: String,
        check_in_date: NaiveDate,
    },

    #[error("Room {room_number} allows at most {max} guests, requested {requested}")]
    OccupancyExceeded {
        room_number: String,
        max: i64,
        requested: i64,
    },

    /// The cash/QR split is larger than what the booking still owes.
    #[error("Payment of {requested} exceeds the amount due ({due})")]
    PaymentExceedsDue { due: Money, requested: Money },

    #[error("Booking {0} is already fully paid")]
    NothingOutstanding(String),

    #[error("Cannot extend booking {0} without a checkout date")]
    MissingCheckoutDate(String),

    /// The room cannot take a guest or a reservation right now.
    #[error("Room {room_number} is {status} and not available")]
    RoomUnavailable {
        room_number: String,
        status: RoomStatus,
    },

    /// A booking's money fields no longer add up. Nothing is written.
    #[error("Booking {booking_id} failed a consistency check: {reason}")]
    Inconsistent {
        booking_id: String,
        reason: &'static str,
    },

    /// The caller's copy of the entity is older than the stored one.
    #[error("{entity} {id} was changed by someone else (expected version {expected}, found {actual})")]
    VersionConflict {
        entity: &'static str,
        id: String,
        expected: i64,
        actual: i64,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::BookingNotFound(_)
            | CoreError::RoomNotFound(_)
            | CoreError::GuestNotFound(_) => ErrorKind::NotFound,
            CoreError::InvalidBookingTransition { .. }
            | CoreError::InvalidRoomTransition { .. }
            | CoreError::CheckInDateNotReached { .. }
            | CoreError::RoomUnavailable { .. }
            | CoreError::Inconsistent { .. } => ErrorKind::StateViolation,
            CoreError::VersionConflict { .. } => ErrorKind::Conflict,
            CoreError::OccupancyExceeded { .. }
            | CoreError::PaymentExceedsDue { .. }
            | CoreError::NothingOutstanding(_)
            | CoreError::MissingCheckoutDate(_)
            | CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid phone number, invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two fields that must be supplied together were not.
    #[error("{first} and {second} must be provided together")]
    IncompletePair { first: String, second: String },

    /// A date range that ends on or before it starts.
    #[error("{field} must be after {after}")]
    DateOrder { field: String, after: NaiveDate },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
