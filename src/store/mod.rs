//! Relational store subsystem.
//!
//! # Data Flow
//! ```text
//! SubscriptionProcessor
//!     → SubscriptionStore (trait seam)
//!     → sqlite.rs (sqlx pool, parameterized SELECT/INSERT/UPDATE)
//!     → user_profiles / payment_history
//! ```
//!
//! # Design Decisions
//! - The profile update is conditional on the values it was computed from;
//!   `Ok(false)` means another writer got there first
//! - Timestamps travel as ISO-8601 UTC text, the format the bot already reads

pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::payments::types::{PaymentRecord, SubscriptionUpdate, UserProfile};

pub use sqlite::SqliteStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Query or connection failure.
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    /// The profile kept changing under the conditional update.
    #[error("profile {telegram_id} was modified concurrently {attempts} times")]
    Conflict { telegram_id: i64, attempts: u32 },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations used by the subscription processor.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Load a profile by Telegram ID.
    async fn find_profile(&self, telegram_id: i64) -> StoreResult<Option<UserProfile>>;

    /// Append a payment record.
    async fn insert_payment(&self, record: &PaymentRecord) -> StoreResult<()>;

    /// Write `update` to the profile if it still matches `expected`.
    ///
    /// Returns `false` when no row matched: the profile changed (or vanished)
    /// since `expected` was read.
    async fn update_subscription(
        &self,
        expected: &UserProfile,
        update: &SubscriptionUpdate,
    ) -> StoreResult<bool>;
}
