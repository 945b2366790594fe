//! Repository for the `rate_windows` table.

use banter_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::rate_window::RateWindow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, subject_key, action_class, window_start, count, created_at, updated_at";

/// Provides counter operations for fixed rate-limit windows.
pub struct RateWindowRepo;

impl RateWindowRepo {
    /// Atomically increment the counter for one window, but only while it is
    /// below `max_requests`.
    ///
    /// A single upsert keeps check-and-increment race-free under concurrent
    /// load: the insert seeds the window at 1, the conflict arm increments,
    /// and the `WHERE` guard turns an at-limit increment into a no-op.
    /// Returns the updated row, or `None` when the limit was already reached.
    pub async fn try_increment(
        pool: &PgPool,
        subject_key: &str,
        action_class: &str,
        window_start: Timestamp,
        max_requests: i32,
    ) -> Result<Option<RateWindow>, sqlx::Error> {
        let query = format!(
            "INSERT INTO rate_windows (subject_key, action_class, window_start, count)
             VALUES ($1, $2, $3, 1)
             ON CONFLICT (subject_key, action_class, window_start) DO UPDATE
                SET count = rate_windows.count + 1
                WHERE rate_windows.count < $4
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RateWindow>(&query)
            .bind(subject_key)
            .bind(action_class)
            .bind(window_start)
            .bind(max_requests)
            .fetch_optional(pool)
            .await
    }

    /// Read the counter for one window without touching it.
    pub async fn find_window(
        pool: &PgPool,
        subject_key: &str,
        action_class: &str,
        window_start: Timestamp,
    ) -> Result<Option<RateWindow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM rate_windows
             WHERE subject_key = $1 AND action_class = $2 AND window_start = $3"
        );
        sqlx::query_as::<_, RateWindow>(&query)
            .bind(subject_key)
            .bind(action_class)
            .bind(window_start)
            .fetch_optional(pool)
            .await
    }

    /// Delete windows that started before `cutoff`. Returns the count of
    /// deleted rows.
    pub async fn delete_older_than(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM rate_windows WHERE window_start < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
