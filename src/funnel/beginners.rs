//! Funnel logging restricted to beginner-level users.

use std::sync::Arc;

use chrono::Utc;
use sqlx::sqlite::SqlitePool;

use crate::config::FunnelConfig;
use crate::funnel::{FunnelObserver, FunnelStep};
use crate::payments::types::format_timestamp;

/// Upserts one `beginners_funnel` row per user, one column per step.
///
/// Users whose survey level is not in the configured beginner list (or who
/// never took the survey) are skipped silently.
#[derive(Clone)]
pub struct BeginnerFunnelLogger {
    pool: SqlitePool,
    beginner_levels: Arc<[String]>,
}

impl BeginnerFunnelLogger {
    pub fn new(pool: SqlitePool, config: &FunnelConfig) -> Self {
        Self {
            pool,
            beginner_levels: config.beginner_levels.clone().into(),
        }
    }

    fn is_beginner(&self, level: &str) -> bool {
        self.beginner_levels.iter().any(|l| l == level)
    }

    /// Write the step for `telegram_id` if they are a beginner.
    ///
    /// Returns whether a row was written.
    pub async fn log_step(&self, telegram_id: i64, step: FunnelStep) -> Result<bool, sqlx::Error> {
        let level: Option<Option<String>> =
            sqlx::query_scalar("SELECT language_level FROM user_survey WHERE telegram_id = ?")
                .bind(telegram_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(level) = level.flatten().filter(|l| self.is_beginner(l)) else {
            return Ok(false);
        };

        let column = step.column();
        let now = format_timestamp(Utc::now());
        let sql = format!(
            "INSERT INTO beginners_funnel (telegram_id, language_level, {column}, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(telegram_id) DO UPDATE SET
                 {column} = excluded.{column},
                 updated_at = excluded.updated_at"
        );

        sqlx::query(&sql)
            .bind(telegram_id)
            .bind(&level)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        tracing::info!(telegram_id, step = column, level = %level, "Logged beginner funnel step");
        Ok(true)
    }
}

impl FunnelObserver for BeginnerFunnelLogger {
    fn record(&self, telegram_id: i64, step: FunnelStep) {
        let logger = self.clone();
        tokio::spawn(async move {
            if let Err(e) = logger.log_step(telegram_id, step).await {
                tracing::warn!(
                    telegram_id,
                    step = step.column(),
                    error = %e,
                    "Failed to log funnel step"
                );
            }
        });
    }
}
