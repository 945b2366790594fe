//! External identity model and DTOs.

use banter_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// An identity row from the `identities` table.
///
/// Binds one `(provider, external_id)` pair to a canonical user. The pair is
/// unique; a user may own several identities across providers.
#[derive(Debug, Clone, FromRow)]
pub struct Identity {
    pub id: DbId,
    pub provider: String,
    pub external_id: String,
    pub user_id: DbId,
    pub last_seen_display_name: String,
    pub last_seen_avatar: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new identity link.
#[derive(Debug, Clone)]
pub struct CreateIdentity {
    pub provider: String,
    pub external_id: String,
    pub user_id: DbId,
    pub last_seen_display_name: String,
    pub last_seen_avatar: Option<String>,
}
