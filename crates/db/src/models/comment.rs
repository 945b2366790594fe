//! Comment entity model and DTOs.

use banter_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full comment row from the `comments` table.
///
/// Deletion is soft: `deleted` hides the content but the row stays so the
/// reply tree keeps its shape and a restore stays possible.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: DbId,
    pub media_id: String,
    pub parent_id: Option<DbId>,
    pub author_id: DbId,
    pub content: String,
    pub deleted: bool,
    pub locked: bool,
    pub pinned: bool,
    pub edit_count: i32,
    pub tags: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new comment.
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub media_id: String,
    pub parent_id: Option<DbId>,
    pub author_id: DbId,
    pub content: String,
}
