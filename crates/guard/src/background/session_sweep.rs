//! Periodic cleanup of expired sessions.
//!
//! Session validation already deletes an expired row when it happens to be
//! presented, but tokens that are simply abandoned would otherwise sit in
//! the table forever. This task deletes every row past its `expires_at` on
//! a fixed interval using `tokio::time::interval`.

use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use banter_db::repositories::SessionRepo;

/// Run the expired-session sweep loop.
///
/// Deletes sessions whose `expires_at` has passed. Runs until `cancel` is
/// triggered.
pub async fn run(pool: PgPool, interval_secs: u64, cancel: CancellationToken) {
    tracing::info!(interval_secs, "Session sweep started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match SessionRepo::delete_expired(&pool).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Session sweep: purged expired sessions");
                        } else {
                            tracing::debug!("Session sweep: no expired sessions");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Session sweep: cleanup failed");
                    }
                }
            }
        }
    }
}
