//! # Room Repository
//!
//! Room inventory and manual status changes.
//!
//! ## Versioned Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE rooms SET ..., version = version + 1                           │
//! │  WHERE id = ? AND version = ?            ← version the caller read     │
//! │                                                                         │
//! │  rows_affected = 1 → write applied, in-memory version bumped           │
//! │  rows_affected = 0 → someone else wrote first → DbError::StaleWrite    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use innkeeper_core::{Clock, CoreError, NewRoom, Room, RoomEvent, RoomStatusLog, RoomUpdate};
use sqlx::{Executor, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{booking, status_log, EntityRef};
use crate::error::{DbError, DbResult, LedgerResult};
use crate::pool::begin_write;

// =============================================================================
// Executor-level operations
// =============================================================================

pub async fn fetch<'e, E>(executor: E, id: &str) -> DbResult<Option<Room>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let room = sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ?1")
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(room)
}

pub async fn insert<'e, E>(executor: E, room: &Room) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %room.id, room_number = %room.room_number, "Inserting room");

    sqlx::query(
        r#"
        INSERT INTO rooms (
            id, room_number, floor, room_type, max_occupancy,
            status, version, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&room.id)
    .bind(&room.room_number)
    .bind(room.floor)
    .bind(room.room_type)
    .bind(room.max_occupancy)
    .bind(room.status)
    .bind(room.version)
    .bind(room.created_at)
    .bind(room.updated_at)
    .execute(executor)
    .await
    .map_err(|e| duplicate_number(e, &room.room_number))?;

    Ok(())
}

/// Writes every mutable column, guarded by the version `room` was read at.
///
/// On success `room.version` and `room.updated_at` match the stored row.
pub async fn update<'e, E>(executor: E, room: &mut Room, now: DateTime<Utc>) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %room.id, status = %room.status, version = room.version, "Updating room");

    let result = sqlx::query(
        r#"
        UPDATE rooms SET
            room_number = ?1,
            floor = ?2,
            room_type = ?3,
            max_occupancy = ?4,
            status = ?5,
            version = version + 1,
            updated_at = ?6
        WHERE id = ?7 AND version = ?8
        "#,
    )
    .bind(&room.room_number)
    .bind(room.floor)
    .bind(room.room_type)
    .bind(room.max_occupancy)
    .bind(room.status)
    .bind(now)
    .bind(&room.id)
    .bind(room.version)
    .execute(executor)
    .await
    .map_err(|e| duplicate_number(e, &room.room_number))?;

    if result.rows_affected() == 0 {
        return Err(DbError::stale("Room", &room.id));
    }

    room.version += 1;
    room.updated_at = now;
    Ok(())
}

fn duplicate_number(err: sqlx::Error, room_number: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("room_number", room_number),
        other => other,
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Room registry: inventory, edits and manual status changes.
#[derive(Clone)]
pub struct RoomRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl RoomRepository {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        RoomRepository { pool, clock }
    }

    /// Adds a room; it starts out available.
    pub async fn create(&self, input: NewRoom) -> LedgerResult<Room> {
        let room = input.into_room(self.clock.now_utc())?;
        insert(&self.pool, &room).await?;

        info!(room_number = %room.room_number, room_type = ?room.room_type, "Room created");
        Ok(room)
    }

    /// Applies a partial update.
    ///
    /// A status change goes through the transition table and lands in the
    /// audit trail without a booking; marking a room clean stamps its last
    /// cleaning entry instead.
    pub async fn update<'a>(&self, target: impl Into<EntityRef<'a>>, changes: RoomUpdate) -> LedgerResult<Room> {
        let target = target.into();
        let now = self.clock.now_utc();
        let mut tx = begin_write(&self.pool).await?;

        let mut room = fetch(&mut *tx, target.id)
            .await?
            .ok_or_else(|| CoreError::RoomNotFound(target.id.to_string()))?;
        target.check_version("Room", room.version)?;

        let active_guests = booking::active_guest_count(&mut *tx, &room.id).await?;
        let event = room.apply_update(changes, active_guests)?;
        update(&mut *tx, &mut room, now).await?;

        match event {
            Some(RoomEvent::Cleaned) => {
                if !status_log::stamp_latest_cleaning(&mut *tx, &room.id, now).await? {
                    warn!(room_number = %room.room_number, "No cleaning entry to stamp");
                }
            }
            Some(event) => {
                let note = match event {
                    RoomEvent::MaintenanceStarted => "Maintenance started",
                    RoomEvent::MaintenanceFinished => "Maintenance finished",
                    _ => "Status changed manually",
                };
                let entry = RoomStatusLog::record(&room.id, None, room.status, Some(note.to_string()), now);
                status_log::insert(&mut *tx, &entry).await?;
            }
            None => {}
        }

        tx.commit().await?;

        info!(room_number = %room.room_number, status = %room.status, "Room updated");
        Ok(room)
    }

    /// All rooms ordered by room number.
    pub async fn list(&self) -> DbResult<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>("SELECT * FROM rooms ORDER BY room_number")
            .fetch_all(&self.pool)
            .await?;
        Ok(rooms)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Room>> {
        fetch(&self.pool, id).await
    }

    pub async fn get_by_number(&self, room_number: &str) -> DbResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE room_number = ?1")
            .bind(room_number.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use innkeeper_core::{ErrorKind, Floor, RoomStatus, RoomType};

    fn new_room(number: &str) -> NewRoom {
        NewRoom {
            room_number: number.to_string(),
            floor: Floor::Ground,
            room_type: RoomType::Standard,
            max_occupancy: 2,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let room = db.rooms().create(new_room("101")).await.unwrap();
        assert_eq!(room.status, RoomStatus::Available);

        let by_number = db.rooms().get_by_number("101").await.unwrap().unwrap();
        assert_eq!(by_number.id, room.id);
        assert!(db.rooms().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_room_number() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.rooms().create(new_room("101")).await.unwrap();
        let err = db.rooms().create(new_room("101")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Duplicate room_number: '101' already exists");
    }

    #[tokio::test]
    async fn test_maintenance_round_trip_is_logged() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let room = db.rooms().create(new_room("102")).await.unwrap();

        let room = db
            .rooms()
            .update(
                &room,
                RoomUpdate {
                    status: Some(RoomStatus::Maintenance),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(room.status, RoomStatus::Maintenance);
        assert_eq!(room.version, 2);

        let room = db
            .rooms()
            .update(
                &room,
                RoomUpdate {
                    status: Some(RoomStatus::Available),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(room.status, RoomStatus::Available);

        let history = db.status_log().for_room(&room.id, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status, RoomStatus::Available);
        assert_eq!(history[1].status, RoomStatus::Maintenance);
        assert!(history.iter().all(|e| e.booking_id.is_none()));
    }

    #[tokio::test]
    async fn test_cannot_set_occupied_manually() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let room = db.rooms().create(new_room("103")).await.unwrap();
        let err = db
            .rooms()
            .update(
                &room.id,
                RoomUpdate {
                    status: Some(RoomStatus::Occupied),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateViolation);
    }

    #[tokio::test]
    async fn test_stale_room_update_conflicts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let room = db.rooms().create(new_room("104")).await.unwrap();
        let stale = room.clone();

        db.rooms()
            .update(
                &room,
                RoomUpdate {
                    max_occupancy: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = db
            .rooms()
            .update(
                &stale,
                RoomUpdate {
                    max_occupancy: Some(4),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let current = db.rooms().get_by_id(&room.id).await.unwrap().unwrap();
        assert_eq!(current.max_occupancy, 3);
    }

    #[tokio::test]
    async fn test_list_orders_by_number() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for number in ["201", "101", "C1"] {
            db.rooms().create(new_room(number)).await.unwrap();
        }
        let numbers: Vec<String> = db.rooms().list().await.unwrap().into_iter().map(|r| r.room_number).collect();
        assert_eq!(numbers, vec!["101", "201", "C1"]);
    }
}
