//! Repository for the `comments` table.

use banter_core::moderation::CommentFlags;
use banter_core::types::DbId;
use sqlx::PgPool;

use crate::models::comment::{Comment, CreateComment};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, media_id, parent_id, author_id, content, deleted, locked, \
                        pinned, edit_count, tags, created_at, updated_at";

/// Provides CRUD operations for comments.
pub struct CommentRepo;

impl CommentRepo {
    /// Insert a new comment, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateComment) -> Result<Comment, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments (media_id, parent_id, author_id, content)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(&input.media_id)
            .bind(input.parent_id)
            .bind(input.author_id)
            .bind(&input.content)
            .fetch_one(pool)
            .await
    }

    /// Find a comment by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Replace a comment's body and bump its edit counter.
    ///
    /// The author, deleted and locked conditions are repeated here so an
    /// edit racing a moderator's lock or delete loses cleanly. Returns
    /// `None` when no editable row matched.
    pub async fn update_content(
        pool: &PgPool,
        id: DbId,
        author_id: DbId,
        content: &str,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!(
            "UPDATE comments
             SET content = $3, edit_count = edit_count + 1
             WHERE id = $1 AND author_id = $2 AND deleted = false AND locked = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(author_id)
            .bind(content)
            .fetch_optional(pool)
            .await
    }

    /// Apply a moderation flag transition as one compare-and-set write.
    ///
    /// The update only lands if the row still carries the `from` flags, so
    /// two moderators racing the same toggle cannot double-apply it.
    /// Returns `None` when the row is missing or its flags moved on.
    pub async fn set_flags(
        pool: &PgPool,
        id: DbId,
        from: CommentFlags,
        to: CommentFlags,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!(
            "UPDATE comments
             SET deleted = $2, locked = $3, pinned = $4
             WHERE id = $1 AND deleted = $5 AND locked = $6 AND pinned = $7
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(to.deleted)
            .bind(to.locked)
            .bind(to.pinned)
            .bind(from.deleted)
            .bind(from.locked)
            .bind(from.pinned)
            .fetch_optional(pool)
            .await
    }

    /// Replace a comment's tag set. Returns `None` if the row is missing.
    pub async fn set_tags(
        pool: &PgPool,
        id: DbId,
        tags: &[String],
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("UPDATE comments SET tags = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(tags)
            .fetch_optional(pool)
            .await
    }

    /// Count comments by an author within the trailing window.
    pub async fn count_recent_by_author(
        pool: &PgPool,
        author_id: DbId,
        window_secs: f64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM comments
             WHERE author_id = $1 AND created_at > NOW() - make_interval(secs => $2)",
        )
        .bind(author_id)
        .bind(window_secs)
        .fetch_one(pool)
        .await
    }

    /// Count all comments ever posted by an author, deleted ones included.
    pub async fn count_total_by_author(
        pool: &PgPool,
        author_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(pool)
            .await
    }

    /// Count comments by an author on one media item within the trailing
    /// window.
    pub async fn count_recent_on_media(
        pool: &PgPool,
        author_id: DbId,
        media_id: &str,
        window_secs: f64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM comments
             WHERE author_id = $1 AND media_id = $2
               AND created_at > NOW() - make_interval(secs => $3)",
        )
        .bind(author_id)
        .bind(media_id)
        .bind(window_secs)
        .fetch_one(pool)
        .await
    }

    /// Fetch the bodies of an author's most recent comments, newest first.
    ///
    /// Deleted comments stay in the sample; removing spam from the board
    /// must not reset the duplicate detector that caught it.
    pub async fn recent_contents_by_author(
        pool: &PgPool,
        author_id: DbId,
        limit: i64,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT content FROM comments
             WHERE author_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2",
        )
        .bind(author_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
