//! Rate limiting against the shared counter store.
//!
//! The check and the increment are one conditional upsert round-trip, so two
//! concurrent requests can never both claim the last slot of a window. A
//! limit being reached is a normal typed outcome here, not an error;
//! [`RateDecision::into_result`] converts it for pipelines that stop on it.

use banter_core::ratelimit::{self, ActionClass, RateLimits};
use banter_core::roles::Role;
use banter_core::types::DbId;
use banter_db::repositories::RateWindowRepo;
use chrono::Utc;
use sqlx::PgPool;

use crate::config::GuardConfig;
use crate::error::GuardResult;

/// Outcome of one rate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Within budget; the increment has already been applied.
    Allowed { remaining: i32 },
    /// The actor or the action class carries no budget.
    Exempt,
    /// Budget exhausted for the current window.
    Limited { retry_after_secs: i64 },
}

impl RateDecision {
    pub fn is_allowed(self) -> bool {
        !matches!(self, Self::Limited { .. })
    }

    /// Convert to a `Result`, mapping [`RateDecision::Limited`] to
    /// [`banter_core::error::CoreError::RateLimited`].
    pub fn into_result(self) -> Result<(), banter_core::error::CoreError> {
        match self {
            Self::Allowed { .. } | Self::Exempt => Ok(()),
            Self::Limited { retry_after_secs } => {
                Err(banter_core::error::CoreError::RateLimited { retry_after_secs })
            }
        }
    }
}

/// Fixed-window limiter over the `rate_windows` table.
#[derive(Clone)]
pub struct RateLimiter {
    pool: PgPool,
    limits: RateLimits,
}

impl RateLimiter {
    pub fn new(pool: PgPool, config: &GuardConfig) -> Self {
        Self { pool, limits: config.rate_limits.clone() }
    }

    pub fn limits(&self) -> &RateLimits {
        &self.limits
    }

    /// Check and consume one unit of `class` budget for `user_id`.
    ///
    /// `super_admin` actors and uncounted classes are exempt and consume
    /// nothing.
    pub async fn check(
        &self,
        user_id: DbId,
        role: Role,
        class: ActionClass,
    ) -> GuardResult<RateDecision> {
        if ratelimit::is_exempt(role) {
            tracing::debug!(user_id, class = class.as_str(), "Rate check: role exempt");
            return Ok(RateDecision::Exempt);
        }
        let Some(quota) = self.limits.quota(class) else {
            return Ok(RateDecision::Exempt);
        };

        let now = Utc::now();
        let window_start = ratelimit::window_start(now, quota.window_secs);
        let subject = ratelimit::user_subject(user_id);

        let row = RateWindowRepo::try_increment(
            &self.pool,
            &subject,
            class.as_str(),
            window_start,
            quota.max_requests,
        )
        .await?;

        match row {
            Some(window) => {
                let remaining = quota.max_requests - window.count;
                tracing::debug!(user_id, class = class.as_str(), remaining, "Rate check: allowed");
                Ok(RateDecision::Allowed { remaining })
            }
            None => {
                let retry_after_secs = ratelimit::retry_after_secs(now, quota.window_secs);
                tracing::debug!(user_id, class = class.as_str(), retry_after_secs,
                    "Rate check: limited");
                Ok(RateDecision::Limited { retry_after_secs })
            }
        }
    }
}
