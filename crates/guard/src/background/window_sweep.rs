//! Periodic cleanup of retired rate-limit counter rows.
//!
//! Counter rows stop mattering once their window closes; they are kept for
//! [`RETENTION_WINDOWS`] extra windows of history and then purged here. The
//! cutoff uses the longest configured window across all action classes, so
//! no class loses a row that could still be live.
//!
//! [`RETENTION_WINDOWS`]: banter_core::ratelimit::RETENTION_WINDOWS

use std::time::Duration;

use banter_core::ratelimit::{retention_cutoff, RateLimits};
use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use banter_db::repositories::RateWindowRepo;

/// Run the rate-window sweep loop.
///
/// Deletes counter rows older than the retention cutoff for the longest
/// configured window. Runs until `cancel` is triggered.
pub async fn run(pool: PgPool, limits: RateLimits, interval_secs: u64, cancel: CancellationToken) {
    let window_secs = longest_window(&limits);
    tracing::info!(interval_secs, window_secs, "Rate-window sweep started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Rate-window sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = retention_cutoff(Utc::now(), window_secs);
                match RateWindowRepo::delete_older_than(&pool, cutoff).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Rate-window sweep: purged retired counters");
                        } else {
                            tracing::debug!("Rate-window sweep: no retired counters");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rate-window sweep: cleanup failed");
                    }
                }
            }
        }
    }
}

fn longest_window(limits: &RateLimits) -> i64 {
    limits
        .comment
        .window_secs
        .max(limits.vote.window_secs)
        .max(limits.report.window_secs)
}

#[cfg(test)]
mod tests {
    use banter_core::ratelimit::{RateLimits, RateQuota};

    use super::longest_window;

    #[test]
    fn longest_window_spans_all_classes() {
        let mut limits = RateLimits::default();
        limits.report = RateQuota { max_requests: 10, window_secs: 7200 };
        assert_eq!(longest_window(&limits), 7200);
    }
}
