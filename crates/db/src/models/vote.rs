//! Vote entity model.

use banter_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A vote row from the `votes` table: one per `(comment_id, user_id)`.
///
/// `reversal_count` and `last_reversed_at` track the current direction-flip
/// streak for churn detection; both are maintained by the upsert itself.
#[derive(Debug, Clone, FromRow)]
pub struct Vote {
    pub id: DbId,
    pub comment_id: DbId,
    pub user_id: DbId,
    pub vote_type: i16,
    pub reversal_count: i32,
    pub last_reversed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
