//! # Validation Module
//!
//! Field validators shared by the booking, room and guest inputs.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Dashboard forms      instant feedback, not trusted           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE          business rules, before any I/O          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite               NOT NULL, UNIQUE, CHECK, foreign keys   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use innkeeper_core::validation::{validate_max_occupancy, validate_room_number};
//!
//! validate_room_number("101").unwrap();
//! assert!(validate_max_occupancy(21).is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{GstRate, ProofType};
use crate::{MAX_EXTENSION_DAYS, MAX_ROOM_OCCUPANCY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field and returns it trimmed.
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates a room number.
///
/// ## Rules
/// - Must not be empty
/// - At most 20 characters
/// - Letters, digits and hyphens only ("101", "C-2")
pub fn validate_room_number(number: &str) -> ValidationResult<String> {
    let number = validate_required_text("room_number", number, 20)?;

    if !number.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "room_number".to_string(),
            reason: "must contain only letters, numbers and hyphens".to_string(),
        });
    }

    Ok(number)
}

/// Validates an identity proof pair.
///
/// Both halves present or both absent; the number is alphanumeric and at
/// most 50 characters. Returns the trimmed number.
pub fn validate_proof(
    proof_type: Option<ProofType>,
    proof_number: Option<&str>,
) -> ValidationResult<Option<String>> {
    let number = proof_number.map(str::trim).filter(|n| !n.is_empty());

    match (proof_type, number) {
        (None, None) => Ok(None),
        (Some(_), Some(number)) => {
            if number.len() > 50 {
                return Err(ValidationError::TooLong {
                    field: "proof_number".to_string(),
                    max: 50,
                });
            }
            if !number.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ') {
                return Err(ValidationError::InvalidFormat {
                    field: "proof_number".to_string(),
                    reason: "must contain only letters and numbers".to_string(),
                });
            }
            Ok(Some(number.to_string()))
        }
        _ => Err(ValidationError::IncompletePair {
            first: "proof_type".to_string(),
            second: "proof_number".to_string(),
        }),
    }
}

/// Validates a phone number: 10-15 digits, optional leading `+`, spaces
/// and hyphens allowed as separators.
///
/// ## Example
/// ```rust
/// use innkeeper_core::validation::validate_phone;
///
/// assert!(validate_phone("+91 98765-43210").is_ok());
/// assert!(validate_phone("12345").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let phone = phone.trim();
    let body = phone.strip_prefix('+').unwrap_or(phone);

    let invalid = || ValidationError::InvalidFormat {
        field: "phone".to_string(),
        reason: "must be 10 to 15 digits".to_string(),
    };

    if !body.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
        return Err(invalid());
    }

    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !(10..=15).contains(&digits) {
        return Err(invalid());
    }

    Ok(phone.to_string())
}

pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim();

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_string()),
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must contain @".to_string(),
        }),
    }
}

/// Validates a GSTIN (15 characters, letters and digits), uppercased.
pub fn validate_gstin(gstin: &str) -> ValidationResult<String> {
    let gstin = gstin.trim().to_ascii_uppercase();

    if gstin.len() != 15 || !gstin.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "gstin".to_string(),
            reason: "must be 15 letters and digits".to_string(),
        });
    }

    Ok(gstin)
}

/// Validates a search query.
///
/// Empty is allowed (lists the newest records). Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a room's configured occupancy (1..=20).
pub fn validate_max_occupancy(max: i64) -> ValidationResult<()> {
    if !(1..=MAX_ROOM_OCCUPANCY).contains(&max) {
        return Err(ValidationError::OutOfRange {
            field: "max_occupancy".to_string(),
            min: 1,
            max: MAX_ROOM_OCCUPANCY,
        });
    }

    Ok(())
}

/// Validates an amount that may be zero but never negative.
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a GST rate in basis points (0% to 100%).
pub fn validate_gst_rate(rate: GstRate) -> ValidationResult<()> {
    if rate.bps() > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "gst_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates the number of days added by an extension.
pub fn validate_extension_days(days: u32) -> ValidationResult<()> {
    if days == 0 {
        return Err(ValidationError::MustBePositive {
            field: "additional_days".to_string(),
        });
    }

    if days > MAX_EXTENSION_DAYS {
        return Err(ValidationError::OutOfRange {
            field: "additional_days".to_string(),
            min: 1,
            max: MAX_EXTENSION_DAYS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// A checkout date, when given, must fall after the check-in date.
pub fn validate_stay_dates(check_in: NaiveDate, check_out: Option<NaiveDate>) -> ValidationResult<()> {
    match check_out {
        Some(check_out) if check_out <= check_in => Err(ValidationError::DateOrder {
            field: "check_out_date".to_string(),
            after: check_in,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
