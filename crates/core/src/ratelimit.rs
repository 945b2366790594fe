//! Fixed-window rate limiting policy and window arithmetic.
//!
//! Counters themselves live in the shared store (`rate_windows` table); this
//! module only decides which window a moment falls into, what the budgets
//! are, and who is exempt. Fixed windows trade smoothing for a single atomic
//! counter row per (subject, class, window).

use chrono::DateTime;

use crate::roles::Role;
use crate::types::{DbId, Timestamp};

/// How many whole windows a retired counter row is kept before the sweep
/// removes it. Two windows of history is enough for debugging bursts.
pub const RETENTION_WINDOWS: i64 = 2;

// ---------------------------------------------------------------------------
// Action classes
// ---------------------------------------------------------------------------

/// Classes of rate-limited activity, each with an independent budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionClass {
    Comment,
    Vote,
    Report,
    Moderation,
}

impl ActionClass {
    /// Stored string form (the `rate_windows.action_class` column).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Vote => "vote",
            Self::Report => "report",
            Self::Moderation => "moderation",
        }
    }
}

// ---------------------------------------------------------------------------
// Quotas
// ---------------------------------------------------------------------------

/// Budget for one action class: at most `max_requests` per `window_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateQuota {
    pub max_requests: i32,
    pub window_secs: i64,
}

/// Per-class quota table.
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub comment: RateQuota,
    pub vote: RateQuota,
    pub report: RateQuota,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            comment: RateQuota { max_requests: 30, window_secs: 3600 },
            vote: RateQuota { max_requests: 100, window_secs: 3600 },
            report: RateQuota { max_requests: 10, window_secs: 3600 },
        }
    }
}

impl RateLimits {
    /// Quota for an action class, or `None` for uncounted classes.
    ///
    /// Moderation is uncounted: only moderator-and-above can reach those
    /// actions at all, and they carry no budget.
    pub fn quota(&self, class: ActionClass) -> Option<RateQuota> {
        match class {
            ActionClass::Comment => Some(self.comment),
            ActionClass::Vote => Some(self.vote),
            ActionClass::Report => Some(self.report),
            ActionClass::Moderation => None,
        }
    }
}

/// `super_admin` is exempt from every class.
pub fn is_exempt(role: Role) -> bool {
    role == Role::SuperAdmin
}

// ---------------------------------------------------------------------------
// Window arithmetic
// ---------------------------------------------------------------------------

/// Truncate `now` to the start of its window, in whole seconds.
///
/// All requests inside one window compute the same start and therefore share
/// one counter row. Sub-second precision is dropped so the truncation is
/// stable across callers.
pub fn window_start(now: Timestamp, window_secs: i64) -> Timestamp {
    let epoch = now.timestamp();
    let floored = epoch - epoch.rem_euclid(window_secs);
    DateTime::from_timestamp(floored, 0).expect("floored epoch seconds are in range")
}

/// Seconds until the current window rolls over; always at least 1.
pub fn retry_after_secs(now: Timestamp, window_secs: i64) -> i64 {
    let epoch = now.timestamp();
    window_secs - epoch.rem_euclid(window_secs)
}

/// Cutoff before which counter rows are sweep-eligible.
pub fn retention_cutoff(now: Timestamp, window_secs: i64) -> Timestamp {
    window_start(now, window_secs) - chrono::Duration::seconds(RETENTION_WINDOWS * window_secs)
}

/// Subject key for a user-scoped budget.
///
/// Keys are namespaced strings so other subject kinds (addresses, API
/// clients) can share the table without colliding.
pub fn user_subject(user_id: DbId) -> String {
    format!("user:{user_id}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
