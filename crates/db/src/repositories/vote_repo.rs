//! Repository for the `votes` table.

use banter_core::types::DbId;
use sqlx::PgPool;

use crate::models::vote::Vote;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, comment_id, user_id, vote_type, reversal_count, last_reversed_at, \
                        created_at, updated_at";

/// Provides CRUD operations for votes.
pub struct VoteRepo;

impl VoteRepo {
    /// Cast or change a vote as one upsert, tracking direction reversals
    /// on the row itself.
    ///
    /// Re-casting the same direction is a no-op for the streak. Flipping
    /// direction within `churn_window_secs` of the previous flip extends
    /// the streak; flipping after a quiet gap starts a new streak at 1.
    pub async fn upsert(
        pool: &PgPool,
        comment_id: DbId,
        user_id: DbId,
        vote_type: i16,
        churn_window_secs: f64,
    ) -> Result<Vote, sqlx::Error> {
        let query = format!(
            "INSERT INTO votes (comment_id, user_id, vote_type)
             VALUES ($1, $2, $3)
             ON CONFLICT (comment_id, user_id) DO UPDATE SET
                vote_type = EXCLUDED.vote_type,
                reversal_count = CASE
                    WHEN votes.vote_type = EXCLUDED.vote_type
                        THEN votes.reversal_count
                    WHEN votes.last_reversed_at IS NULL
                         OR votes.last_reversed_at <= NOW() - make_interval(secs => $4)
                        THEN 1
                    ELSE votes.reversal_count + 1
                END,
                last_reversed_at = CASE
                    WHEN votes.vote_type = EXCLUDED.vote_type
                        THEN votes.last_reversed_at
                    ELSE NOW()
                END
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Vote>(&query)
            .bind(comment_id)
            .bind(user_id)
            .bind(vote_type)
            .bind(churn_window_secs)
            .fetch_one(pool)
            .await
    }

    /// Find a user's vote on a comment.
    pub async fn find_by_comment_and_user(
        pool: &PgPool,
        comment_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Vote>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM votes WHERE comment_id = $1 AND user_id = $2");
        sqlx::query_as::<_, Vote>(&query)
            .bind(comment_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Remove a user's vote from a comment. Returns `true` if a row was
    /// deleted; removing an absent vote is not an error.
    pub async fn delete(
        pool: &PgPool,
        comment_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM votes WHERE comment_id = $1 AND user_id = $2")
            .bind(comment_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count votes on a comment cast by accounts younger than the given age.
    pub async fn count_votes_from_young_accounts(
        pool: &PgPool,
        comment_id: DbId,
        max_account_age_secs: f64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM votes v
             JOIN users u ON u.id = v.user_id
             WHERE v.comment_id = $1
               AND u.created_at > NOW() - make_interval(secs => $2)",
        )
        .bind(comment_id)
        .bind(max_account_age_secs)
        .fetch_one(pool)
        .await
    }
}
