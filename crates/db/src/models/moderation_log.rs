//! Moderation audit log model and DTOs.

use banter_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// An audit entry from the `moderation_log` table. Append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ModerationLogEntry {
    pub id: DbId,
    pub actor_id: DbId,
    pub action: String,
    pub target_kind: String,
    pub target_id: DbId,
    pub reason: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording a moderation action.
#[derive(Debug, Clone)]
pub struct CreateLogEntry {
    pub actor_id: DbId,
    pub action: String,
    pub target_kind: String,
    pub target_id: DbId,
    pub reason: Option<String>,
    pub details: Option<serde_json::Value>,
}
