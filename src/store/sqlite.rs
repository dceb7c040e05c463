//! sqlx-backed store over a SQLite-compatible database.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use crate::config::DatabaseConfig;
use crate::payments::types::{
    format_timestamp, parse_timestamp, PaymentRecord, SubscriptionUpdate, UserProfile,
};
use crate::store::{StoreResult, SubscriptionStore};

/// Tables this service reads or writes. Created only when
/// `database.create_schema` is set; in production they belong to the bot.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS user_profiles (
        telegram_id INTEGER PRIMARY KEY,
        subscribed_at TEXT,
        subscription_expired_at TEXT,
        next_lesson_access_at TEXT,
        amount_paid REAL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS payment_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        telegram_id INTEGER NOT NULL,
        amount REAL NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS user_survey (
        telegram_id INTEGER PRIMARY KEY,
        language_level TEXT
    )",
    "CREATE TABLE IF NOT EXISTS beginners_funnel (
        telegram_id INTEGER PRIMARY KEY,
        language_level TEXT,
        subscription_activated_at TEXT,
        subscription_renewed_at TEXT,
        updated_at TEXT
    )",
];

/// Subscription store over an sqlx SQLite pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool from configuration, creating the schema if configured.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(config.create_schema);

        // Every in-memory connection is its own database.
        let max_connections = if config.url.contains(":memory:") {
            1
        } else {
            config.max_connections
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self::new(pool);
        if config.create_schema {
            store.create_schema().await?;
        }

        tracing::info!(max_connections, "Database pool ready");
        Ok(store)
    }

    /// Create missing tables.
    pub async fn create_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// The underlying pool, shared with the funnel logger.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// A timestamp column as read: blank or NULL is absent, unparseable text is
/// kept apart so callers can decide how to treat it.
enum StoredTimestamp {
    Absent,
    At(DateTime<Utc>),
    Unreadable,
}

impl StoredTimestamp {
    fn value(&self) -> Option<DateTime<Utc>> {
        match self {
            StoredTimestamp::At(at) => Some(*at),
            StoredTimestamp::Absent | StoredTimestamp::Unreadable => None,
        }
    }
}

fn timestamp_column(
    row: &SqliteRow,
    telegram_id: i64,
    column: &str,
) -> StoreResult<StoredTimestamp> {
    let raw: Option<String> = row.try_get(column)?;
    let Some(value) = raw.filter(|v| !v.trim().is_empty()) else {
        return Ok(StoredTimestamp::Absent);
    };

    Ok(match parse_timestamp(&value) {
        Some(at) => StoredTimestamp::At(at),
        None => {
            tracing::warn!(telegram_id, column, value = %value, "Unparseable timestamp in profile");
            StoredTimestamp::Unreadable
        }
    })
}

#[async_trait]
impl SubscriptionStore for SqliteStore {
    async fn find_profile(&self, telegram_id: i64) -> StoreResult<Option<UserProfile>> {
        let row = sqlx::query(
            "SELECT subscribed_at, subscription_expired_at, next_lesson_access_at,
                    CAST(COALESCE(amount_paid, 0) AS REAL) AS amount_paid
             FROM user_profiles WHERE telegram_id = ?",
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expiry = timestamp_column(&row, telegram_id, "subscription_expired_at")?;

        Ok(Some(UserProfile {
            telegram_id,
            subscribed_at: timestamp_column(&row, telegram_id, "subscribed_at")?.value(),
            subscription_expired_at: expiry.value(),
            next_lesson_access_at: timestamp_column(&row, telegram_id, "next_lesson_access_at")?
                .value(),
            amount_paid: row.try_get("amount_paid")?,
            expiry_unreadable: matches!(expiry, StoredTimestamp::Unreadable),
        }))
    }

    async fn insert_payment(&self, record: &PaymentRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO payment_history (telegram_id, amount, status, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(record.telegram_id)
        .bind(record.amount)
        .bind(&record.status)
        .bind(format_timestamp(record.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_subscription(
        &self,
        expected: &UserProfile,
        update: &SubscriptionUpdate,
    ) -> StoreResult<bool> {
        // Every processed payment bumps amount_paid, so it doubles as a version.
        let result = sqlx::query(
            "UPDATE user_profiles
             SET subscribed_at = ?,
                 subscription_expired_at = ?,
                 next_lesson_access_at = ?,
                 amount_paid = ?
             WHERE telegram_id = ? AND COALESCE(amount_paid, 0) = ?",
        )
        .bind(format_timestamp(update.subscribed_at))
        .bind(format_timestamp(update.subscription_expired_at))
        .bind(format_timestamp(update.next_lesson_access_at))
        .bind(update.amount_paid)
        .bind(expected.telegram_id)
        .bind(expected.amount_paid)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
