//! # Room Status Log Repository
//!
//! The append-only audit trail of room transitions. Rows are only ever
//! inserted, except that marking a room clean stamps `cleaned_at` on its
//! latest `cleaning` row.

use chrono::{DateTime, Utc};
use innkeeper_core::RoomStatusLog;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

// =============================================================================
// Executor-level operations
// =============================================================================

pub async fn insert<'e, E>(executor: E, entry: &RoomStatusLog) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(room_id = %entry.room_id, status = %entry.status, "Appending room status log");

    sqlx::query(
        r#"
        INSERT INTO room_status_log (
            id, room_id, booking_id, status, notes, cleaned_at, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.room_id)
    .bind(&entry.booking_id)
    .bind(entry.status)
    .bind(&entry.notes)
    .bind(entry.cleaned_at)
    .bind(entry.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Stamps `cleaned_at` on the newest `cleaning` row of a room.
///
/// Returns false when the room has no cleaning row.
pub async fn stamp_latest_cleaning<'e, E>(executor: E, room_id: &str, now: DateTime<Utc>) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE room_status_log
        SET cleaned_at = ?1
        WHERE id = (
            SELECT id FROM room_status_log
            WHERE room_id = ?2 AND status = 'cleaning'
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
        )
        "#,
    )
    .bind(now)
    .bind(room_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct StatusLogRepository {
    pool: SqlitePool,
}

impl StatusLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StatusLogRepository { pool }
    }

    /// A room's history, newest first.
    pub async fn for_room(&self, room_id: &str, limit: u32) -> DbResult<Vec<RoomStatusLog>> {
        let entries = sqlx::query_as::<_, RoomStatusLog>(
            r#"
            SELECT * FROM room_status_log
            WHERE room_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(room_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Every entry a booking caused, oldest first.
    pub async fn for_booking(&self, booking_id: &str) -> DbResult<Vec<RoomStatusLog>> {
        let entries = sqlx::query_as::<_, RoomStatusLog>(
            r#"
            SELECT * FROM room_status_log
            WHERE booking_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
