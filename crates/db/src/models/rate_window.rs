//! Fixed-window rate counter model.

use banter_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A counter row from the `rate_windows` table.
///
/// One row per `(subject_key, action_class, window_start)`; the row is
/// created lazily by the first action in its window and retired by the
/// retention sweep.
#[derive(Debug, Clone, FromRow)]
pub struct RateWindow {
    pub id: DbId,
    pub subject_key: String,
    pub action_class: String,
    pub window_start: Timestamp,
    pub count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
