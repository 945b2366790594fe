//! Repository for the `identities` table.

use banter_core::types::DbId;
use sqlx::PgPool;

use crate::models::identity::{CreateIdentity, Identity};
use crate::models::user::User;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, provider, external_id, user_id, last_seen_display_name, \
                        last_seen_avatar, created_at, updated_at";

/// User columns returned by the transactional create below.
const USER_COLUMNS: &str =
    "id, display_name, role, banned, shadow_banned, muted_until, created_at, updated_at";

/// Provides CRUD operations for provider identities.
pub struct IdentityRepo;

impl IdentityRepo {
    /// Insert a new identity link, returning the created row.
    ///
    /// Returns `None` when `(provider, external_id)` is already linked;
    /// concurrent resolvers race on the `uq_identities_provider_external`
    /// constraint and exactly one wins. Losers should re-read the winner
    /// with [`IdentityRepo::find_by_provider_external`].
    pub async fn create(
        pool: &PgPool,
        input: &CreateIdentity,
    ) -> Result<Option<Identity>, sqlx::Error> {
        let query = format!(
            "INSERT INTO identities
                (provider, external_id, user_id, last_seen_display_name, last_seen_avatar)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (provider, external_id) DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Identity>(&query)
            .bind(&input.provider)
            .bind(&input.external_id)
            .bind(input.user_id)
            .bind(&input.last_seen_display_name)
            .bind(&input.last_seen_avatar)
            .fetch_optional(pool)
            .await
    }

    /// Atomically create a fresh user and link a new identity to it.
    ///
    /// Returns `None` when `(provider, external_id)` was linked by a
    /// concurrent resolver; the transaction is rolled back so no orphan
    /// user row survives the lost race. Losers should re-read the winner
    /// with [`IdentityRepo::find_by_provider_external`].
    pub async fn create_with_new_user(
        pool: &PgPool,
        provider: &str,
        external_id: &str,
        display_name: &str,
        avatar: Option<&str>,
    ) -> Result<Option<(User, Identity)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user_query =
            format!("INSERT INTO users (display_name) VALUES ($1) RETURNING {USER_COLUMNS}");
        let user = sqlx::query_as::<_, User>(&user_query)
            .bind(display_name)
            .fetch_one(&mut *tx)
            .await?;

        let identity_query = format!(
            "INSERT INTO identities
                (provider, external_id, user_id, last_seen_display_name, last_seen_avatar)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (provider, external_id) DO NOTHING
             RETURNING {COLUMNS}"
        );
        let identity = sqlx::query_as::<_, Identity>(&identity_query)
            .bind(provider)
            .bind(external_id)
            .bind(user.id)
            .bind(display_name)
            .bind(avatar)
            .fetch_optional(&mut *tx)
            .await?;

        match identity {
            Some(identity) => {
                tx.commit().await?;
                Ok(Some((user, identity)))
            }
            // Dropping the uncommitted transaction rolls back the user
            // insert along with it.
            None => Ok(None),
        }
    }

    /// Find an identity by its provider-scoped external ID.
    pub async fn find_by_provider_external(
        pool: &PgPool,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<Identity>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM identities WHERE provider = $1 AND external_id = $2");
        sqlx::query_as::<_, Identity>(&query)
            .bind(provider)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    /// List all identities linked to a user, oldest first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Identity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM identities WHERE user_id = $1 ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Identity>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Refresh the profile snapshot captured at the last successful
    /// verification. Returns `true` if the row was updated.
    pub async fn update_last_seen(
        pool: &PgPool,
        id: DbId,
        display_name: &str,
        avatar: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE identities SET last_seen_display_name = $2, last_seen_avatar = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(display_name)
        .bind(avatar)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
