//! # Guest Repository
//!
//! Guest registration, edits and front-desk search. Guests are never
//! deleted; bookings keep pointing at them after checkout or cancellation.

use chrono::{DateTime, Utc};
use innkeeper_core::guest::{GuestUpdate, NewGuest};
use innkeeper_core::validation::validate_search_query;
use innkeeper_core::{Clock, CoreError, Guest};
use sqlx::{Executor, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{DbError, DbResult, LedgerResult};
use crate::pool::begin_write;

// =============================================================================
// Executor-level operations
// =============================================================================

pub async fn fetch<'e, E>(executor: E, id: &str) -> DbResult<Option<Guest>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let guest = sqlx::query_as::<_, Guest>("SELECT * FROM guests WHERE id = ?1")
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(guest)
}

pub async fn insert<'e, E>(executor: E, guest: &Guest) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %guest.id, "Inserting guest");

    sqlx::query(
        r#"
        INSERT INTO guests (
            id, name, address, proof_type, proof_number,
            phone, email, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&guest.id)
    .bind(&guest.name)
    .bind(&guest.address)
    .bind(guest.proof_type)
    .bind(&guest.proof_number)
    .bind(&guest.phone)
    .bind(&guest.email)
    .bind(guest.created_at)
    .bind(guest.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

async fn update<'e, E>(executor: E, guest: &mut Guest, now: DateTime<Utc>) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %guest.id, "Updating guest");

    let result = sqlx::query(
        r#"
        UPDATE guests SET
            name = ?1,
            address = ?2,
            proof_type = ?3,
            proof_number = ?4,
            phone = ?5,
            email = ?6,
            updated_at = ?7
        WHERE id = ?8
        "#,
    )
    .bind(&guest.name)
    .bind(&guest.address)
    .bind(guest.proof_type)
    .bind(&guest.proof_number)
    .bind(&guest.phone)
    .bind(&guest.email)
    .bind(now)
    .bind(&guest.id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Guest", &guest.id));
    }

    guest.updated_at = now;
    Ok(())
}

// =============================================================================
// Registry
// =============================================================================

#[derive(Clone)]
pub struct GuestRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl GuestRepository {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        GuestRepository { pool, clock }
    }

    pub async fn create(&self, input: NewGuest) -> LedgerResult<Guest> {
        let guest = input.into_guest(self.clock.now_utc())?;
        insert(&self.pool, &guest).await?;

        info!(id = %guest.id, has_proof = guest.has_proof(), "Guest registered");
        Ok(guest)
    }

    /// Applies a partial update; invalid input leaves the stored guest as is.
    pub async fn update(&self, id: &str, changes: GuestUpdate) -> LedgerResult<Guest> {
        let mut tx = begin_write(&self.pool).await?;

        let mut guest = fetch(&mut *tx, id)
            .await?
            .ok_or_else(|| CoreError::GuestNotFound(id.to_string()))?;
        guest.apply_update(changes)?;
        update(&mut *tx, &mut guest, self.clock.now_utc()).await?;

        tx.commit().await?;
        Ok(guest)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Guest>> {
        fetch(&self.pool, id).await
    }

    /// Substring search over name and phone, newest first.
    ///
    /// An empty query lists the most recently registered guests.
    pub async fn search(&self, query: &str, limit: u32) -> LedgerResult<Vec<Guest>> {
        let query = validate_search_query(query)?;
        debug!(query = %query, limit, "Searching guests");

        let pattern = format!("%{}%", escape_like(&query));
        let guests = sqlx::query_as::<_, Guest>(
            r#"
            SELECT * FROM guests
            WHERE ?1 = '' OR name LIKE ?2 ESCAPE '\' OR phone LIKE ?2 ESCAPE '\'
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?3
            "#,
        )
        .bind(&query)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = guests.len(), "Guest search returned");
        Ok(guests)
    }
}

fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
