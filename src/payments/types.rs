//! Subscription payment types.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Amount credited per processed payment, in currency units.
pub const PAYMENT_AMOUNT: f64 = 1.0;

/// Status written to every payment record.
pub const PAYMENT_STATUS_COMPLETED: &str = "completed";

/// Subscription state of a user, as stored in `user_profiles`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Telegram user (and chat) identifier.
    pub telegram_id: i64,
    /// When the latest payment was applied.
    pub subscribed_at: Option<DateTime<Utc>>,
    /// End of the paid period.
    pub subscription_expired_at: Option<DateTime<Utc>>,
    /// When the next lesson unlocks.
    pub next_lesson_access_at: Option<DateTime<Utc>>,
    /// Cumulative amount paid. Absent in the store reads as 0.
    pub amount_paid: f64,
    /// A non-empty stored expiry that could not be parsed. Such a period is
    /// treated as still running.
    #[serde(skip)]
    pub expiry_unreadable: bool,
}

impl UserProfile {
    /// Whether a paid period is still running at `now`. A period ending
    /// exactly at `now` counts as running.
    pub fn is_subscription_active(&self, now: DateTime<Utc>) -> bool {
        match self.subscription_expired_at {
            Some(expiry) => expiry >= now,
            None => self.expiry_unreadable,
        }
    }

    /// Whether the next lesson can be started at `now`.
    pub fn is_lesson_available(&self, now: DateTime<Utc>) -> bool {
        self.next_lesson_access_at.is_some_and(|at| at <= now)
    }
}

/// One row of `payment_history`. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub telegram_id: i64,
    pub amount: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// A completed payment of the fixed weekly amount.
    pub fn completed(telegram_id: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            telegram_id,
            amount: PAYMENT_AMOUNT,
            status: PAYMENT_STATUS_COMPLETED.to_string(),
            created_at,
        }
    }
}

/// Which branch of the unlock policy a payment took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionKind {
    /// No prior expiry, or the prior period already ended.
    New,
    /// The prior period is still running.
    Renewal,
}

impl SubscriptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionKind::New => "new",
            SubscriptionKind::Renewal => "renewal",
        }
    }
}

/// The four profile fields written by a processed payment.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionUpdate {
    pub subscribed_at: DateTime<Utc>,
    pub subscription_expired_at: DateTime<Utc>,
    pub next_lesson_access_at: DateTime<Utc>,
    pub amount_paid: f64,
    pub kind: SubscriptionKind,
}

/// Format a timestamp the way the store and the webhook response carry it:
/// UTC, millisecond precision, `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Naive layouts read as UTC: SQLite's `datetime()` output and ISO without offset.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a stored timestamp. Accepts any RFC 3339 offset, or a naive
/// `YYYY-MM-DD HH:MM:SS[.fff]` taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}
