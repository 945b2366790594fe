//! User entity model and DTOs.

use banter_core::error::CoreError;
use banter_core::roles::Role;
use banter_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// `role` is stored as text and constrained by `ck_users_role`; use
/// [`User::role`] for the typed form.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub display_name: String,
    pub role: String,
    pub banned: bool,
    pub shadow_banned: bool,
    pub muted_until: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Typed role, parsed from the stored string.
    pub fn role(&self) -> Result<Role, CoreError> {
        Role::parse(&self.role)
    }
}

/// DTO for creating a new user. Role always starts at `user`; higher roles
/// are only reachable through moderation transitions or direct grant.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub display_name: String,
}
