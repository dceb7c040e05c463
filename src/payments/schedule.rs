//! Subscription window and lesson unlock policy.
//!
//! All calendar arithmetic happens in the service's local time, a fixed UTC
//! offset taken from `schedule.utc_offset_minutes`.

use chrono::{
    DateTime, Days, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Utc,
};

use crate::payments::types::{SubscriptionKind, SubscriptionUpdate, UserProfile, PAYMENT_AMOUNT};

/// Length of one paid period, in calendar days.
pub const SUBSCRIPTION_DAYS: u64 = 7;

/// Local hour at which scheduled lessons unlock.
pub const LESSON_UNLOCK_HOUR: i64 = 2;

/// How far in the past an immediate unlock is stamped, in seconds, so
/// "unlockable now" checks on a slightly skewed clock still pass.
pub const IMMEDIATE_UNLOCK_SKEW_SECS: i64 = 60;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Computes subscription updates for a fixed local offset.
#[derive(Debug, Clone, Copy)]
pub struct LessonSchedule {
    offset: FixedOffset,
}

impl Default for LessonSchedule {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }
}

impl LessonSchedule {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Build from an offset in minutes; `None` if it is out of range.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Self::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// End of the paid period starting at `now`: 23:59:59.999 local on the
    /// day seven days ahead.
    pub fn subscription_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let expiry_day = self.local_date(now) + Days::new(SUBSCRIPTION_DAYS);
        self.to_utc(start_of_day(expiry_day + Days::new(1)) - Duration::milliseconds(1))
    }

    /// When the next lesson unlocks, and which policy branch decided it.
    ///
    /// A subscriber with no running period unlocks immediately. A renewing
    /// subscriber waits for the next 02:00 local slot.
    pub fn next_lesson_access(
        &self,
        now: DateTime<Utc>,
        period_running: bool,
    ) -> (DateTime<Utc>, SubscriptionKind) {
        if period_running {
            (self.next_unlock_slot(now), SubscriptionKind::Renewal)
        } else {
            (now - Duration::seconds(IMMEDIATE_UNLOCK_SKEW_SECS), SubscriptionKind::New)
        }
    }

    /// 02:00 local today if it is not yet 02:00, otherwise 02:00 tomorrow.
    pub fn next_unlock_slot(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local = now.with_timezone(&self.offset).naive_local();
        let today_slot = start_of_day(local.date()) + Duration::hours(LESSON_UNLOCK_HOUR);
        if local < today_slot {
            self.to_utc(today_slot)
        } else {
            self.to_utc(today_slot + Duration::days(1))
        }
    }

    /// Everything a processed payment writes to the profile.
    pub fn compute_update(&self, now: DateTime<Utc>, profile: &UserProfile) -> SubscriptionUpdate {
        let (next_lesson_access_at, kind) =
            self.next_lesson_access(now, profile.is_subscription_active(now));

        SubscriptionUpdate {
            subscribed_at: now,
            subscription_expired_at: self.subscription_expiry(now),
            next_lesson_access_at,
            amount_paid: profile.amount_paid + PAYMENT_AMOUNT,
            kind,
        }
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        Utc.from_utc_datetime(&(local - self.offset))
    }
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}
