//! Repository for the `reports` table.

use banter_core::types::DbId;
use sqlx::PgPool;

use crate::models::report::{CreateReport, Report};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, comment_id, reporter_id, reason, notes, status, created_at, updated_at";

/// Provides CRUD operations for reports.
pub struct ReportRepo;

impl ReportRepo {
    /// Insert a new report, returning the created row.
    ///
    /// Returns `None` when the reporter already has an open report on the
    /// comment. The conflict target names the partial unique index
    /// `uq_reports_open_comment_reporter`, so closed reports never block a
    /// fresh one.
    pub async fn create(
        pool: &PgPool,
        input: &CreateReport,
    ) -> Result<Option<Report>, sqlx::Error> {
        let query = format!(
            "INSERT INTO reports (comment_id, reporter_id, reason, notes)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (comment_id, reporter_id)
                WHERE status IN ('pending', 'escalated')
                DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(input.comment_id)
            .bind(input.reporter_id)
            .bind(&input.reason)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }

    /// Find a report by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Report>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reports WHERE id = $1");
        sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List open reports (pending or escalated), oldest first.
    pub async fn list_open(pool: &PgPool, limit: i64) -> Result<Vec<Report>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reports
             WHERE status IN ('pending', 'escalated')
             ORDER BY created_at ASC, id ASC
             LIMIT $1"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// List reports filed against one comment, newest first.
    pub async fn list_for_comment(
        pool: &PgPool,
        comment_id: DbId,
    ) -> Result<Vec<Report>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reports WHERE comment_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(comment_id)
            .fetch_all(pool)
            .await
    }

    /// Move a report from one status to another as a compare-and-set write.
    ///
    /// Returns `None` when the row is missing or no longer in `from_status`,
    /// which is how a moderator racing another's resolution loses.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        from_status: &str,
        to_status: &str,
    ) -> Result<Option<Report>, sqlx::Error> {
        let query = format!(
            "UPDATE reports SET status = $3 WHERE id = $1 AND status = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .bind(from_status)
            .bind(to_status)
            .fetch_optional(pool)
            .await
    }

    /// Count reports ever filed against an author's comments, any status.
    pub async fn count_against_author(
        pool: &PgPool,
        author_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reports r
             JOIN comments c ON c.id = r.comment_id
             WHERE c.author_id = $1",
        )
        .bind(author_id)
        .fetch_one(pool)
        .await
    }
}
