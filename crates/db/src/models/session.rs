//! Session model and DTOs.

use banter_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A session row from the `sessions` table.
///
/// Holds only the token's SHA-256 digest; the plaintext token is never
/// persisted anywhere.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: DbId,
    pub token_hash: String,
    pub token_prefix: String,
    pub user_id: DbId,
    pub provider: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub last_used_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub token_hash: String,
    pub token_prefix: String,
    pub user_id: DbId,
    pub provider: String,
    pub expires_at: Timestamp,
}
