//! Repository for the `users` table.

use banter_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, display_name, role, banned, shadow_banned, muted_until, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user with the default `user` role, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (display_name)
             VALUES ($1)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.display_name)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find users by display name (case-sensitive, exact match).
    ///
    /// Display names are not unique, so callers that want to link an identity
    /// by name must treat anything other than exactly one row as ambiguous.
    /// At most two rows are fetched; one is enough to link, two is enough to
    /// know the name is contested.
    pub async fn find_by_display_name(
        pool: &PgPool,
        display_name: &str,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE display_name = $1
             ORDER BY created_at ASC, id ASC
             LIMIT 2"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(display_name)
            .fetch_all(pool)
            .await
    }

    /// Update a user's display name. Returns `true` if the row was updated.
    pub async fn set_display_name(
        pool: &PgPool,
        id: DbId,
        display_name: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET display_name = $2 WHERE id = $1")
            .bind(id)
            .bind(display_name)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace a user's role. Returns `true` if the row was updated.
    ///
    /// The role string must already be validated; the `ck_users_role` check
    /// constraint rejects anything outside the known set.
    pub async fn set_role(pool: &PgPool, id: DbId, role: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set or clear the `banned` flag.
    ///
    /// The update only applies when the flag actually changes, so a
    /// `false` return means the user was missing or a concurrent actor
    /// already applied the same transition.
    pub async fn set_banned(pool: &PgPool, id: DbId, banned: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET banned = $2 WHERE id = $1 AND banned <> $2")
            .bind(id)
            .bind(banned)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set or clear the `shadow_banned` flag.
    ///
    /// Same conditional-update semantics as [`UserRepo::set_banned`].
    pub async fn set_shadow_banned(
        pool: &PgPool,
        id: DbId,
        shadow_banned: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET shadow_banned = $2 WHERE id = $1 AND shadow_banned <> $2",
        )
        .bind(id)
        .bind(shadow_banned)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the mute expiry, or clear it with `None`.
    ///
    /// Re-muting an already muted user overwrites the expiry; issuing a new
    /// mute is how moderators extend or shorten one.
    pub async fn set_muted_until(
        pool: &PgPool,
        id: DbId,
        muted_until: Option<Timestamp>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET muted_until = $2 WHERE id = $1")
            .bind(id)
            .bind(muted_until)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
