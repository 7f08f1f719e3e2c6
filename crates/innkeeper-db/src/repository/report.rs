//! # Report Repository
//!
//! Loads bookings and rooms for the revenue and housekeeping views. The
//! arithmetic lives in [`innkeeper_core::report`].

use chrono::NaiveDate;
use innkeeper_core::report::{month_bounds, month_label, summarize, HousekeepingBoard, PeriodSummary};
use innkeeper_core::{Booking, Guest, Room, ValidationError};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::debug;

use super::booking::checking_in_between;
use crate::error::{DbResult, LedgerResult};

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Summary of bookings checking in on `start..=end`.
    pub async fn date_range(&self, start: NaiveDate, end: NaiveDate) -> LedgerResult<PeriodSummary> {
        if end < start {
            return Err(ValidationError::DateOrder {
                field: "end".to_string(),
                after: start,
            }
            .into());
        }
        let label = format!("{} - {}", start, end);
        Ok(self.summary(label, start, end).await?)
    }

    pub async fn daily(&self, date: NaiveDate) -> DbResult<PeriodSummary> {
        self.summary(date.to_string(), date, date).await
    }

    pub async fn monthly(&self, year: i32, month: u32) -> LedgerResult<PeriodSummary> {
        let (start, end) = month_bounds(year, month).ok_or_else(|| ValidationError::OutOfRange {
            field: "month".to_string(),
            min: 1,
            max: 12,
        })?;
        Ok(self.summary(month_label(start), start, end).await?)
    }

    /// Twelve monthly summaries, January first.
    pub async fn yearly(&self, year: i32) -> LedgerResult<Vec<PeriodSummary>> {
        let (start, _) = month_bounds(year, 1).ok_or_else(|| ValidationError::OutOfRange {
            field: "year".to_string(),
            min: 1,
            max: 9999,
        })?;
        let (_, end) = month_bounds(year, 12).ok_or_else(|| ValidationError::OutOfRange {
            field: "year".to_string(),
            min: 1,
            max: 9999,
        })?;

        let bookings = checking_in_between(&self.pool, start, end).await?;
        let rooms = self.rooms().await?;

        let mut months = Vec::with_capacity(12);
        for month in 1..=12 {
            if let Some((first, last)) = month_bounds(year, month) {
                months.push(summarize(month_label(first), first, last, &bookings, &rooms));
            }
        }
        Ok(months)
    }

    /// Rooms grouped by status with the stay that explains each.
    pub async fn housekeeping(&self) -> DbResult<HousekeepingBoard> {
        let rooms = self.rooms().await?;

        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE status IN ('checked_in', 'checked_out')
              AND room_id IN (SELECT id FROM rooms WHERE status IN ('occupied', 'cleaning'))
            ORDER BY updated_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let guests: HashMap<String, Guest> = sqlx::query_as::<_, Guest>(
            r#"
            SELECT * FROM guests
            WHERE id IN (
                SELECT guest_id FROM bookings
                WHERE status IN ('checked_in', 'checked_out')
                  AND room_id IN (SELECT id FROM rooms WHERE status IN ('occupied', 'cleaning'))
            )
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|g| (g.id.clone(), g))
        .collect();

        Ok(HousekeepingBoard::build(rooms, &bookings, &guests))
    }

    async fn summary(&self, label: String, start: NaiveDate, end: NaiveDate) -> DbResult<PeriodSummary> {
        let bookings = checking_in_between(&self.pool, start, end).await?;
        let rooms = self.rooms().await?;

        debug!(%start, %end, bookings = bookings.len(), "Building period summary");
        Ok(summarize(label, start, end, &bookings, &rooms))
    }

    async fn rooms(&self) -> DbResult<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>("SELECT * FROM rooms ORDER BY room_number")
            .fetch_all(&self.pool)
            .await?;
        Ok(rooms)
    }
}
