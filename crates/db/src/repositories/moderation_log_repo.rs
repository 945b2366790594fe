//! Repository for the `moderation_log` table.

use banter_core::types::DbId;
use sqlx::PgPool;

use crate::models::moderation_log::{CreateLogEntry, ModerationLogEntry};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, actor_id, action, target_kind, target_id, reason, details, created_at, updated_at";

/// Provides append and read operations for the moderation audit trail.
///
/// The log is append-only; there are no update or delete methods.
pub struct ModerationLogRepo;

impl ModerationLogRepo {
    /// Append a log entry, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateLogEntry,
    ) -> Result<ModerationLogEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO moderation_log (actor_id, action, target_kind, target_id, reason, details)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ModerationLogEntry>(&query)
            .bind(input.actor_id)
            .bind(&input.action)
            .bind(&input.target_kind)
            .bind(input.target_id)
            .bind(&input.reason)
            .bind(&input.details)
            .fetch_one(pool)
            .await
    }

    /// List entries for one target, newest first.
    pub async fn list_for_target(
        pool: &PgPool,
        target_kind: &str,
        target_id: DbId,
        limit: i64,
    ) -> Result<Vec<ModerationLogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM moderation_log
             WHERE target_kind = $1 AND target_id = $2
             ORDER BY created_at DESC, id DESC
             LIMIT $3"
        );
        sqlx::query_as::<_, ModerationLogEntry>(&query)
            .bind(target_kind)
            .bind(target_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// List entries recorded by one actor, newest first.
    pub async fn list_for_actor(
        pool: &PgPool,
        actor_id: DbId,
        limit: i64,
    ) -> Result<Vec<ModerationLogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM moderation_log
             WHERE actor_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, ModerationLogEntry>(&query)
            .bind(actor_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
