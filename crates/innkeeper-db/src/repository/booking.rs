//! # Booking Repository
//!
//! Row-level booking storage. All writes go through
//! [`crate::ledger::BookingLedger`], which wraps these functions in one
//! transaction per transition; [`BookingRepository`] is the read side.

use chrono::{DateTime, NaiveDate, Utc};
use innkeeper_core::{Booking, BookingStatus};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

// =============================================================================
// Executor-level operations
// =============================================================================

pub async fn fetch<'e, E>(executor: E, id: &str) -> DbResult<Option<Booking>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?1")
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(booking)
}

pub async fn insert<'e, E>(executor: E, booking: &Booking) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %booking.id, room_id = %booking.room_id, status = %booking.status, "Inserting booking");

    sqlx::query(
        r#"
        INSERT INTO bookings (
            id, room_id, guest_id,
            check_in_date, check_out_date, actual_check_in_time, actual_check_out_time,
            number_of_guests,
            base_amount_paise, gst_rate_bps, gst_amount_paise, total_amount_paise,
            amount_paid_paise, qr_amount_paise, cash_amount_paise, payment_method,
            extended_amount_paise,
            cancellation_charge_paise, refund_amount_paise, cancelled_at,
            gstin, status, version, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3,
            ?4, ?5, ?6, ?7,
            ?8,
            ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16,
            ?17,
            ?18, ?19, ?20,
            ?21, ?22, ?23, ?24, ?25
        )
        "#,
    )
    .bind(&booking.id)
    .bind(&booking.room_id)
    .bind(&booking.guest_id)
    .bind(booking.check_in_date)
    .bind(booking.check_out_date)
    .bind(booking.actual_check_in_time)
    .bind(booking.actual_check_out_time)
    .bind(booking.number_of_guests)
    .bind(booking.base_amount_paise)
    .bind(booking.gst_rate_bps)
    .bind(booking.gst_amount_paise)
    .bind(booking.total_amount_paise)
    .bind(booking.amount_paid_paise)
    .bind(booking.qr_amount_paise)
    .bind(booking.cash_amount_paise)
    .bind(booking.payment_method)
    .bind(booking.extended_amount_paise)
    .bind(booking.cancellation_charge_paise)
    .bind(booking.refund_amount_paise)
    .bind(booking.cancelled_at)
    .bind(&booking.gstin)
    .bind(booking.status)
    .bind(booking.version)
    .bind(booking.created_at)
    .bind(booking.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Writes every mutable column, guarded by the version `booking` was read at.
///
/// On success `booking.version` and `booking.updated_at` match the stored row.
pub async fn update<'e, E>(executor: E, booking: &mut Booking, now: DateTime<Utc>) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %booking.id, status = %booking.status, version = booking.version, "Updating booking");

    let result = sqlx::query(
        r#"
        UPDATE bookings SET
            room_id = ?1,
            check_in_date = ?2,
            check_out_date = ?3,
            actual_check_in_time = ?4,
            actual_check_out_time = ?5,
            number_of_guests = ?6,
            base_amount_paise = ?7,
            gst_rate_bps = ?8,
            gst_amount_paise = ?9,
            total_amount_paise = ?10,
            amount_paid_paise = ?11,
            qr_amount_paise = ?12,
            cash_amount_paise = ?13,
            payment_method = ?14,
            extended_amount_paise = ?15,
            cancellation_charge_paise = ?16,
            refund_amount_paise = ?17,
            cancelled_at = ?18,
            gstin = ?19,
            status = ?20,
            version = version + 1,
            updated_at = ?21
        WHERE id = ?22 AND version = ?23
        "#,
    )
    .bind(&booking.room_id)
    .bind(booking.check_in_date)
    .bind(booking.check_out_date)
    .bind(booking.actual_check_in_time)
    .bind(booking.actual_check_out_time)
    .bind(booking.number_of_guests)
    .bind(booking.base_amount_paise)
    .bind(booking.gst_rate_bps)
    .bind(booking.gst_amount_paise)
    .bind(booking.total_amount_paise)
    .bind(booking.amount_paid_paise)
    .bind(booking.qr_amount_paise)
    .bind(booking.cash_amount_paise)
    .bind(booking.payment_method)
    .bind(booking.extended_amount_paise)
    .bind(booking.cancellation_charge_paise)
    .bind(booking.refund_amount_paise)
    .bind(booking.cancelled_at)
    .bind(&booking.gstin)
    .bind(booking.status)
    .bind(now)
    .bind(&booking.id)
    .bind(booking.version)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::stale("Booking", &booking.id));
    }

    booking.version += 1;
    booking.updated_at = now;
    Ok(())
}

/// Reserved bookings on `room_id` other than `exclude_id`.
pub async fn count_other_reservations<'e, E>(executor: E, room_id: &str, exclude_id: &str) -> DbResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM bookings WHERE room_id = ?1 AND status = 'reserved' AND id <> ?2",
    )
    .bind(room_id)
    .bind(exclude_id)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

/// Party size of the stay currently holding the room, if any.
pub async fn active_guest_count<'e, E>(executor: E, room_id: &str) -> DbResult<Option<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let guests: Option<i64> = sqlx::query_scalar(
        "SELECT number_of_guests FROM bookings WHERE room_id = ?1 AND status = 'checked_in' LIMIT 1",
    )
    .bind(room_id)
    .fetch_optional(executor)
    .await?;

    Ok(guests)
}

/// Bookings whose check-in date falls in `start..=end`.
pub async fn checking_in_between<'e, E>(executor: E, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Booking>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let bookings = sqlx::query_as::<_, Booking>(
        r#"
        SELECT * FROM bookings
        WHERE check_in_date BETWEEN ?1 AND ?2
        ORDER BY check_in_date, created_at
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(executor)
    .await?;

    Ok(bookings)
}

// =============================================================================
// Repository
// =============================================================================

/// Read-only booking queries for the dashboard.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Booking>> {
        fetch(&self.pool, id).await
    }

    /// Bookings in a status, newest first.
    pub async fn list_by_status(&self, status: BookingStatus, limit: u32) -> DbResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE status = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// A guest's stays, newest first.
    pub async fn list_for_guest(&self, guest_id: &str) -> DbResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE guest_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )
        .bind(guest_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// The stay currently holding a room.
    pub async fn active_for_room(&self, room_id: &str) -> DbResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE room_id = ?1 AND status = 'checked_in' LIMIT 1",
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    /// Advance bookings arriving on `date`.
    pub async fn arrivals_on(&self, date: NaiveDate) -> DbResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE status = 'reserved' AND check_in_date = ?1 ORDER BY created_at",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    pub async fn checking_in_between(&self, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Booking>> {
        checking_in_between(&self.pool, start, end).await
    }
}
