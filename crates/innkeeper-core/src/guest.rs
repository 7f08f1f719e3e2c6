//! Guest inputs and their validation.
//!
//! Guests have no status of their own and are never deleted; see
//! [`crate::types::Guest`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::types::{Guest, ProofType};
use crate::validation::{validate_email, validate_phone, validate_proof, validate_required_text};

const MAX_TEXT_LEN: usize = 200;

/// Input for registering a guest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewGuest {
    pub name: String,
    pub address: String,
    pub proof_type: Option<ProofType>,
    pub proof_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl NewGuest {
    pub fn into_guest(self, now: DateTime<Utc>) -> CoreResult<Guest> {
        let name = validate_required_text("name", &self.name, MAX_TEXT_LEN)?;
        let address = validate_required_text("address", &self.address, MAX_TEXT_LEN)?;
        let proof_number = validate_proof(self.proof_type, self.proof_number.as_deref())?;

        Ok(Guest {
            id: Uuid::new_v4().to_string(),
            name,
            address,
            proof_type: proof_number.as_ref().and(self.proof_type),
            proof_number,
            phone: optional(self.phone.as_deref(), validate_phone)?,
            email: optional(self.email.as_deref(), validate_email)?,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial guest update; `None` leaves a field as is, an empty phone or
/// email clears it.
///
/// Proof is replaced as a pair: supplying only one half is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuestUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub proof_type: Option<ProofType>,
    pub proof_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Guest {
    /// Applies an update; on error the guest is unchanged.
    pub fn apply_update(&mut self, update: GuestUpdate) -> CoreResult<()> {
        let name = update
            .name
            .map(|n| validate_required_text("name", &n, MAX_TEXT_LEN))
            .transpose()?;
        let address = update
            .address
            .map(|a| validate_required_text("address", &a, MAX_TEXT_LEN))
            .transpose()?;
        let proof = if update.proof_type.is_some() || update.proof_number.is_some() {
            Some(validate_proof(update.proof_type, update.proof_number.as_deref())?)
        } else {
            None
        };
        let phone = update
            .phone
            .map(|p| optional(Some(p.as_str()), validate_phone))
            .transpose()?;
        let email = update
            .email
            .map(|e| optional(Some(e.as_str()), validate_email))
            .transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(address) = address {
            self.address = address;
        }
        if let Some(number) = proof {
            self.proof_type = number.as_ref().and(update.proof_type);
            self.proof_number = number;
        }
        if let Some(phone) = phone {
            self.phone = phone;
        }
        if let Some(email) = email {
            self.email = email;
        }
        Ok(())
    }
}

/// Runs `validate` on a non-blank value; blank means absent.
fn optional<F, E>(value: Option<&str>, validate: F) -> CoreResult<Option<String>>
where
    F: Fn(&str) -> Result<String, E>,
    E: Into<crate::error::CoreError>,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => validate(v).map(Some).map_err(Into::into),
        None => Ok(None),
    }
}
