//! Subscription payment processing.
//!
//! Only the profile update is load-bearing. The payment-history insert, the
//! confirmation re-read, the funnel event and the Telegram notification are
//! best-effort: their failures are logged and counted, never returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::funnel::{FunnelObserver, FunnelStep, NoopFunnel};
use crate::observability::metrics;
use crate::payments::schedule::{Clock, LessonSchedule, SystemClock};
use crate::payments::types::{
    format_timestamp, PaymentRecord, SubscriptionKind, SubscriptionUpdate, UserProfile,
};
use crate::store::{StoreError, SubscriptionStore};
use crate::telegram::Notifier;

/// Errors surfaced to the webhook caller.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// No profile row for the Telegram ID.
    #[error("User not found: {0}")]
    UserNotFound(i64),

    /// The authoritative read or write failed.
    #[error("Database error: {0}")]
    Persistence(#[from] StoreError),
}

/// Outcome of a processed payment.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSubscription {
    pub telegram_id: i64,
    pub subscription_expired_at: DateTime<Utc>,
    pub next_lesson_access_at: DateTime<Utc>,
    pub amount_paid: f64,
    pub kind: SubscriptionKind,
}

/// Applies subscription payments to user profiles.
pub struct SubscriptionProcessor {
    store: Arc<dyn SubscriptionStore>,
    notifier: Arc<dyn Notifier>,
    funnel: Arc<dyn FunnelObserver>,
    clock: Arc<dyn Clock>,
    schedule: LessonSchedule,
    max_update_attempts: u32,
}

impl SubscriptionProcessor {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        notifier: Arc<dyn Notifier>,
        schedule: LessonSchedule,
    ) -> Self {
        Self {
            store,
            notifier,
            funnel: Arc::new(NoopFunnel),
            clock: Arc::new(SystemClock),
            schedule,
            max_update_attempts: 3,
        }
    }

    pub fn with_funnel(mut self, funnel: Arc<dyn FunnelObserver>) -> Self {
        self.funnel = funnel;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_max_update_attempts(mut self, attempts: u32) -> Self {
        self.max_update_attempts = attempts.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn SubscriptionStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Process one weekly subscription payment for `telegram_id`.
    pub async fn process(&self, telegram_id: i64) -> Result<ProcessedSubscription, ProcessError> {
        info!(telegram_id, "Processing subscription");

        let mut profile = self.load_profile(telegram_id).await?;
        info!(
            telegram_id,
            current_subscription = ?profile.subscription_expired_at,
            current_next_lesson = ?profile.next_lesson_access_at,
            amount_paid = profile.amount_paid,
            "Loaded subscription profile"
        );

        let mut update = self.schedule.compute_update(self.clock.now(), &profile);

        let record = PaymentRecord::completed(telegram_id, self.clock.now());
        match self.store.insert_payment(&record).await {
            Ok(()) => info!(telegram_id, "Payment recorded"),
            Err(e) => {
                warn!(telegram_id, error = %e, "Failed to record payment, continuing");
                metrics::record_side_effect_failure("payment_history");
            }
        }

        let mut attempt = 1;
        loop {
            info!(
                telegram_id,
                attempt,
                new_subscription_expired_at = %format_timestamp(update.subscription_expired_at),
                new_next_lesson_access_at = %format_timestamp(update.next_lesson_access_at),
                "Updating subscription profile"
            );

            if self.store.update_subscription(&profile, &update).await? {
                break;
            }

            if attempt >= self.max_update_attempts {
                warn!(telegram_id, attempt, "Giving up on contended profile update");
                return Err(StoreError::Conflict {
                    telegram_id,
                    attempts: attempt,
                }
                .into());
            }

            warn!(telegram_id, attempt, "Profile changed during update, recomputing");
            attempt += 1;
            profile = self.load_profile(telegram_id).await?;
            update = self.schedule.compute_update(self.clock.now(), &profile);
        }

        self.confirm_update(telegram_id).await;

        info!(
            telegram_id,
            kind = update.kind.as_str(),
            until = %format_timestamp(update.subscription_expired_at),
            "Subscription activated"
        );
        metrics::record_subscription_processed(update.kind.as_str());

        self.funnel.record(telegram_id, funnel_step(&update));

        if let Err(e) = self.notifier.send_subscription_confirmation(telegram_id).await {
            warn!(telegram_id, error = %e, "Failed to send subscription confirmation");
            metrics::record_side_effect_failure("notification");
        }

        Ok(ProcessedSubscription {
            telegram_id,
            subscription_expired_at: update.subscription_expired_at,
            next_lesson_access_at: update.next_lesson_access_at,
            amount_paid: update.amount_paid,
            kind: update.kind,
        })
    }

    async fn load_profile(&self, telegram_id: i64) -> Result<UserProfile, ProcessError> {
        match self.store.find_profile(telegram_id).await? {
            Some(profile) => Ok(profile),
            None => {
                warn!(telegram_id, "User not found");
                Err(ProcessError::UserNotFound(telegram_id))
            }
        }
    }

    async fn confirm_update(&self, telegram_id: i64) {
        match self.store.find_profile(telegram_id).await {
            Ok(Some(p)) => info!(
                telegram_id,
                subscription_expired_at = ?p.subscription_expired_at,
                next_lesson_access_at = ?p.next_lesson_access_at,
                "Profile after update"
            ),
            Ok(None) => warn!(telegram_id, "Profile vanished after update"),
            Err(e) => {
                warn!(telegram_id, error = %e, "Failed to re-read profile after update");
                metrics::record_side_effect_failure("confirmation_read");
            }
        }
    }
}

fn funnel_step(update: &SubscriptionUpdate) -> FunnelStep {
    match update.kind {
        SubscriptionKind::New => FunnelStep::SubscriptionActivated,
        SubscriptionKind::Renewal => FunnelStep::SubscriptionRenewed,
    }
}
