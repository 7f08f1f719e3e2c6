//! Key/value settings. Only `gst_rate` (a percentage, e.g. `"18"`) is read
//! by the backend.

use innkeeper_core::{Clock, GstRate, ValidationError, DEFAULT_GST_RATE_PERCENT};
use sqlx::{Executor, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{DbResult, LedgerResult};

pub const GST_RATE_KEY: &str = "gst_rate";

/// Reads the configured GST rate, falling back to the default when the
/// setting is missing or not a percentage between 0 and 100.
pub async fn load_gst_rate<'e, E>(executor: E) -> DbResult<GstRate>
where
    E: Executor<'e, Database = Sqlite>,
{
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
        .bind(GST_RATE_KEY)
        .fetch_optional(executor)
        .await?;

    Ok(parse_gst_rate(value.as_deref()))
}

fn parse_gst_rate(value: Option<&str>) -> GstRate {
    let Some(raw) = value else {
        warn!(default = DEFAULT_GST_RATE_PERCENT, "No gst_rate setting, using default");
        return GstRate::from_percentage(DEFAULT_GST_RATE_PERCENT);
    };

    match raw.trim().parse::<f64>() {
        Ok(pct) if pct.is_finite() && (0.0..=100.0).contains(&pct) => GstRate::from_percentage(pct),
        _ => {
            warn!(value = %raw, default = DEFAULT_GST_RATE_PERCENT, "Unusable gst_rate setting, using default");
            GstRate::from_percentage(DEFAULT_GST_RATE_PERCENT)
        }
    }
}

#[derive(Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        SettingsRepository { pool, clock }
    }

    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    /// The rate new bookings default to.
    pub async fn gst_rate(&self) -> DbResult<GstRate> {
        load_gst_rate(&self.pool).await
    }

    /// Stores a new default GST percentage. Existing bookings keep theirs.
    pub async fn set_gst_rate(&self, percent: f64) -> LedgerResult<()> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(ValidationError::OutOfRange {
                field: GST_RATE_KEY.to_string(),
                min: 0,
                max: 100,
            }
            .into());
        }

        debug!(percent, "Updating gst_rate setting");

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(GST_RATE_KEY)
        .bind(percent.to_string())
        .bind(self.clock.now_utc())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
