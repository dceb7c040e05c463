//! Subscription payment processing.
//!
//! # Data Flow
//! ```text
//! webhook request
//!     → processor.rs (load profile, apply payment, notify)
//!     → schedule.rs (expiry + next lesson unlock policy)
//!     → store (authoritative update) / telegram + funnel (best-effort)
//! ```

pub mod processor;
pub mod schedule;
pub mod types;

pub use processor::{ProcessError, ProcessedSubscription, SubscriptionProcessor};
pub use schedule::{Clock, LessonSchedule, SystemClock};
pub use types::{PaymentRecord, SubscriptionKind, SubscriptionUpdate, UserProfile};
