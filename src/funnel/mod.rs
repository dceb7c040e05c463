//! Beginner funnel instrumentation.
//!
//! The processor reports funnel steps through [`FunnelObserver`]. Recording
//! never blocks the caller and never fails it: the beginner logger runs on a
//! spawned task and swallows its own errors.

pub mod beginners;

use serde::{Deserialize, Serialize};

pub use beginners::BeginnerFunnelLogger;

/// A funnel milestone. Each maps to one timestamp column of `beginners_funnel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStep {
    /// First payment, or first after a lapse.
    SubscriptionActivated,
    /// Payment while a period was still running.
    SubscriptionRenewed,
}

impl FunnelStep {
    /// Column written for this step. Fixed strings only: the name is spliced
    /// into SQL.
    pub fn column(&self) -> &'static str {
        match self {
            FunnelStep::SubscriptionActivated => "subscription_activated_at",
            FunnelStep::SubscriptionRenewed => "subscription_renewed_at",
        }
    }
}

/// Receives funnel events. Implementations must return promptly.
pub trait FunnelObserver: Send + Sync {
    fn record(&self, telegram_id: i64, step: FunnelStep);
}

/// Observer used when funnel logging is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFunnel;

impl FunnelObserver for NoopFunnel {
    fn record(&self, _telegram_id: i64, _step: FunnelStep) {}
}
