//! # Repository Module
//!
//! Database repository implementations for Innkeeper.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Layers per Table                                 │
//! │                                                                         │
//! │  Free functions, generic over the executor                             │
//! │  ├── fetch(&mut *tx, id)                                               │
//! │  ├── insert(&mut *tx, &entity)                                         │
//! │  └── update(&mut *tx, &mut entity, now)   ← version-guarded            │
//! │       │                                                                 │
//! │       │  used inside BookingLedger transactions                        │
//! │       ▼                                                                 │
//! │  Repository structs over the pool                                      │
//! │  ├── RoomRepository / GuestRepository   (registries)                   │
//! │  ├── BookingRepository                  (read side)                    │
//! │  ├── StatusLogRepository                (audit trail)                  │
//! │  ├── SettingsRepository                 (GST rate)                     │
//! │  └── ReportRepository                   (summaries, housekeeping)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use innkeeper_core::{Booking, CoreError, CoreResult, Room};

pub mod booking;
pub mod guest;
pub mod report;
pub mod room;
pub mod settings;
pub mod status_log;

/// Identifies the booking or room an operation targets.
///
/// Built from a bare id, or from the entity itself, in which case the
/// version it was read at is checked before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRef<'a> {
    pub id: &'a str,
    pub version: Option<i64>,
}

impl<'a> EntityRef<'a> {
    pub fn new(id: &'a str, version: Option<i64>) -> Self {
        EntityRef { id, version }
    }

    /// Fails when the caller read an older version than `actual`.
    pub fn check_version(&self, entity: &'static str, actual: i64) -> CoreResult<()> {
        match self.version {
            Some(expected) if expected != actual => Err(CoreError::VersionConflict {
                entity,
                id: self.id.to_string(),
                expected,
                actual,
            }),
            _ => Ok(()),
        }
    }
}

impl<'a> From<&'a str> for EntityRef<'a> {
    fn from(id: &'a str) -> Self {
        EntityRef { id, version: None }
    }
}

impl<'a> From<&'a String> for EntityRef<'a> {
    fn from(id: &'a String) -> Self {
        EntityRef { id, version: None }
    }
}

impl<'a> From<&'a Booking> for EntityRef<'a> {
    fn from(booking: &'a Booking) -> Self {
        EntityRef {
            id: &booking.id,
            version: Some(booking.version),
        }
    }
}

impl<'a> From<&'a Room> for EntityRef<'a> {
    fn from(room: &'a Room) -> Self {
        EntityRef {
            id: &room.id,
            version: Some(room.version),
        }
    }
}
