//! # Room State Machine
//!
//! Room status only changes through [`RoomStatus::apply`]. Booking events
//! drive most transitions; housekeeping and maintenance drive the rest.
//!
//! ## Transition Table
//! ```text
//! ┌─────────────────────┬──────────────────────────┬──────────────┐
//! │ Event               │ From                     │ To           │
//! ├─────────────────────┼──────────────────────────┼──────────────┤
//! │ GuestCheckedIn      │ available                │ occupied     │
//! │ GuestCheckedOut     │ occupied                 │ cleaning     │
//! │ Cleaned             │ cleaning                 │ available    │
//! │ Released            │ available                │ available    │
//! │ MaintenanceStarted  │ available, cleaning      │ maintenance  │
//! │ MaintenanceFinished │ maintenance              │ available    │
//! └─────────────────────┴──────────────────────────┴──────────────┘
//! ```
//!
//! `Released` records a reservation letting go of a room. The status does
//! not move, but the audit trail shows why the room is free.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{Floor, Room, RoomStatus, RoomStatusLog, RoomType};
use crate::validation::{validate_max_occupancy, validate_room_number};

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomEvent {
    GuestCheckedIn,
    GuestCheckedOut,
    Cleaned,
    Released,
    MaintenanceStarted,
    MaintenanceFinished,
}

impl RoomEvent {
    /// Verb phrase used in transition errors ("Room 101 is occupied, cannot ...").
    pub const fn action(&self) -> &'static str {
        match self {
            RoomEvent::GuestCheckedIn => "check in a guest",
            RoomEvent::GuestCheckedOut => "check out a guest",
            RoomEvent::Cleaned => "be marked cleaned",
            RoomEvent::Released => "be released",
            RoomEvent::MaintenanceStarted => "go into maintenance",
            RoomEvent::MaintenanceFinished => "leave maintenance",
        }
    }

    /// Picks the event behind a manual status change from the dashboard.
    ///
    /// Returns `None` when the room already has the requested status.
    /// Occupancy is only ever changed by bookings.
    pub fn for_manual_change(room: &Room, target: RoomStatus) -> CoreResult<Option<RoomEvent>> {
        if room.status == target {
            return Ok(None);
        }

        let event = match (room.status, target) {
            (_, RoomStatus::Maintenance) => RoomEvent::MaintenanceStarted,
            (RoomStatus::Maintenance, RoomStatus::Available) => RoomEvent::MaintenanceFinished,
            (RoomStatus::Cleaning, RoomStatus::Available) => RoomEvent::Cleaned,
            (status, _) => {
                return Err(CoreError::InvalidRoomTransition {
                    room_number: room.room_number.clone(),
                    status,
                    action: match target {
                        RoomStatus::Occupied => "be set to occupied manually",
                        RoomStatus::Cleaning => "be set to cleaning manually",
                        _ => "change status manually",
                    },
                })
            }
        };

        Ok(Some(event))
    }
}

impl RoomStatus {
    /// Applies an event, returning the next status if the table allows it.
    pub fn apply(self, event: RoomEvent) -> Option<RoomStatus> {
        use RoomEvent::*;
        use RoomStatus::*;

        match (self, event) {
            (Available, GuestCheckedIn) => Some(Occupied),
            (Occupied, GuestCheckedOut) => Some(Cleaning),
            (Cleaning, Cleaned) => Some(Available),
            (Available, Released) => Some(Available),
            (Available | Cleaning, MaintenanceStarted) => Some(Maintenance),
            (Maintenance, MaintenanceFinished) => Some(Available),
            _ => None,
        }
    }
}

// =============================================================================
// Room Mutations
// =============================================================================

impl Room {
    /// Moves the room through the transition table.
    pub fn transition(&mut self, event: RoomEvent) -> CoreResult<RoomStatus> {
        let next = self.status.apply(event).ok_or_else(|| CoreError::InvalidRoomTransition {
            room_number: self.room_number.clone(),
            status: self.status,
            action: event.action(),
        })?;
        self.status = next;
        Ok(next)
    }

    /// A guest can only move into an available room.
    pub fn ensure_available(&self) -> CoreResult<()> {
        if self.status != RoomStatus::Available {
            return Err(CoreError::RoomUnavailable {
                room_number: self.room_number.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    /// A reservation may be moved onto any room not being cleaned or repaired.
    pub fn ensure_reservable(&self) -> CoreResult<()> {
        match self.status {
            RoomStatus::Cleaning | RoomStatus::Maintenance => Err(CoreError::RoomUnavailable {
                room_number: self.room_number.clone(),
                status: self.status,
            }),
            _ => Ok(()),
        }
    }

    /// Applies a partial update.
    ///
    /// `active_guests` is the party size of the checked-in stay in this room,
    /// if any; occupancy may not drop below it. Returns the status event to
    /// log when the update changed the status.
    pub fn apply_update(
        &mut self,
        update: RoomUpdate,
        active_guests: Option<i64>,
    ) -> CoreResult<Option<RoomEvent>> {
        if let Some(number) = update.room_number {
            self.room_number = validate_room_number(&number)?;
        }
        if let Some(floor) = update.floor {
            self.floor = floor;
        }
        if let Some(room_type) = update.room_type {
            self.room_type = room_type;
        }
        if let Some(max) = update.max_occupancy {
            validate_max_occupancy(max)?;
            if let Some(guests) = active_guests {
                if max < guests {
                    return Err(CoreError::OccupancyExceeded {
                        room_number: self.room_number.clone(),
                        max,
                        requested: guests,
                    });
                }
            }
            self.max_occupancy = max;
        }

        let Some(target) = update.status else {
            return Ok(None);
        };
        let Some(event) = RoomEvent::for_manual_change(self, target)? else {
            return Ok(None);
        };
        self.transition(event)?;
        Ok(Some(event))
    }
}

// =============================================================================
// Inputs
// =============================================================================

/// Input for adding a room to the inventory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewRoom {
    pub room_number: String,
    pub floor: Floor,
    pub room_type: RoomType,
    pub max_occupancy: i64,
}

impl NewRoom {
    /// Validates the input and builds an available room.
    pub fn into_room(self, now: DateTime<Utc>) -> CoreResult<Room> {
        let room_number = validate_room_number(&self.room_number)?;
        validate_max_occupancy(self.max_occupancy)?;

        Ok(Room {
            id: Uuid::new_v4().to_string(),
            room_number,
            floor: self.floor,
            room_type: self.room_type,
            max_occupancy: self.max_occupancy,
            status: RoomStatus::Available,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial room update; `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomUpdate {
    pub room_number: Option<String>,
    pub floor: Option<Floor>,
    pub room_type: Option<RoomType>,
    pub max_occupancy: Option<i64>,
    pub status: Option<RoomStatus>,
}

// =============================================================================
// Audit Entries
// =============================================================================

impl RoomStatusLog {
    /// Builds a new audit entry for a room that just moved to `status`.
    pub fn record(
        room_id: &str,
        booking_id: Option<&str>,
        status: RoomStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        RoomStatusLog {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            booking_id: booking_id.map(str::to_string),
            status,
            notes,
            cleaned_at: None,
            created_at: now,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
