//! Identity resolution: from a verified provider identity to a canonical
//! user, plus the full sign-in flow.
//!
//! Resolution is keyed on `(provider, external_id)`. Concurrent resolution
//! of the same key is serialized by the uniqueness constraint on that pair;
//! a lost insert race always resolves to "load the winner", never an error
//! out of this module.

use std::sync::Arc;

use banter_core::authz::DenyReason;
use banter_core::error::CoreError;
use banter_core::types::Timestamp;
use banter_db::models::identity::{CreateIdentity, Identity};
use banter_db::models::user::User;
use banter_db::repositories::{IdentityRepo, UserRepo};
use sqlx::PgPool;

use crate::error::{GuardError, GuardResult};
use crate::session::SessionManager;
use crate::verifier::{CanonicalIdentity, ProviderClient};

/// Successful sign-in: the plaintext session token (returned exactly once),
/// its expiry, and a snapshot of the resolved user.
#[derive(Debug)]
pub struct SignIn {
    pub token: String,
    pub expires_at: Timestamp,
    pub user: User,
}

/// Maps verified provider identities onto canonical users.
pub struct IdentityResolver {
    pool: PgPool,
    client: Arc<dyn ProviderClient>,
    sessions: SessionManager,
}

impl IdentityResolver {
    pub fn new(pool: PgPool, client: Arc<dyn ProviderClient>, sessions: SessionManager) -> Self {
        Self { pool, client, sessions }
    }

    /// Verify a raw credential, resolve the user behind it, and issue a
    /// session.
    ///
    /// Banned accounts fail `Forbidden(banned)` after resolution and before
    /// any session is issued. Verification failures convert to the domain
    /// taxonomy here and never carry the raw credential.
    pub async fn sign_in(&self, provider: &str, credential: &str) -> GuardResult<SignIn> {
        let canonical = self
            .client
            .verify(provider, credential)
            .await
            .map_err(|failure| GuardError::Core(failure.into()))?;

        let user = self.resolve(provider, &canonical).await?;

        if user.banned {
            tracing::warn!(user_id = user.id, provider, "Banned account attempted sign-in");
            return Err(GuardError::Core(CoreError::Forbidden(
                DenyReason::Banned.as_str().to_string(),
            )));
        }

        let issued = self.sessions.issue(user.id, provider).await?;
        tracing::info!(user_id = user.id, provider, "Sign-in complete");
        Ok(SignIn { token: issued.token, expires_at: issued.expires_at, user })
    }

    /// Resolve a verified identity to its canonical user.
    ///
    /// 1. An existing `(provider, external_id)` link wins outright; the
    ///    stored profile snapshot and the user's display name are refreshed
    ///    if the provider reports new values.
    /// 2. Otherwise, exactly one existing user with the same display name is
    ///    linked to this identity. An ambiguous name (several users share
    ///    it) is treated like no match at all.
    /// 3. Otherwise a fresh user and the identity are created atomically.
    ///
    /// Does not evaluate banned or muted state; callers judge the returned
    /// snapshot themselves.
    pub async fn resolve(
        &self,
        provider: &str,
        canonical: &CanonicalIdentity,
    ) -> GuardResult<User> {
        if let Some(identity) =
            IdentityRepo::find_by_provider_external(&self.pool, provider, &canonical.external_id)
                .await?
        {
            return self.refresh_linked(identity, canonical).await;
        }

        let name_matches = UserRepo::find_by_display_name(&self.pool, &canonical.display_name).await?;
        if let [only_match] = name_matches.as_slice() {
            let created = IdentityRepo::create(
                &self.pool,
                &CreateIdentity {
                    provider: provider.to_string(),
                    external_id: canonical.external_id.clone(),
                    user_id: only_match.id,
                    last_seen_display_name: canonical.display_name.clone(),
                    last_seen_avatar: canonical.avatar.clone(),
                },
            )
            .await?;
            match created {
                Some(_) => {
                    tracing::info!(user_id = only_match.id, provider,
                        "Linked new identity to existing user by display name");
                    return Ok(only_match.clone());
                }
                None => return self.load_race_winner(provider, canonical).await,
            }
        }

        let created = IdentityRepo::create_with_new_user(
            &self.pool,
            provider,
            &canonical.external_id,
            &canonical.display_name,
            canonical.avatar.as_deref(),
        )
        .await?;
        match created {
            Some((user, _identity)) => {
                tracing::info!(user_id = user.id, provider, "Created user for new identity");
                Ok(user)
            }
            None => self.load_race_winner(provider, canonical).await,
        }
    }

    /// Load the user behind an existing identity link, syncing the stored
    /// profile snapshot and the user's display name with what the provider
    /// reported this time.
    async fn refresh_linked(
        &self,
        identity: Identity,
        canonical: &CanonicalIdentity,
    ) -> GuardResult<User> {
        let mut user = self.load_linked_user(&identity).await?;

        let snapshot_stale = identity.last_seen_display_name != canonical.display_name
            || identity.last_seen_avatar.as_deref() != canonical.avatar.as_deref();
        if snapshot_stale {
            IdentityRepo::update_last_seen(
                &self.pool,
                identity.id,
                &canonical.display_name,
                canonical.avatar.as_deref(),
            )
            .await?;
        }

        if user.display_name != canonical.display_name {
            UserRepo::set_display_name(&self.pool, user.id, &canonical.display_name).await?;
            tracing::info!(user_id = user.id, "Synced display name from provider");
            user.display_name = canonical.display_name.clone();
        }

        Ok(user)
    }

    /// After a lost insert race, the winner's row is committed; load it.
    async fn load_race_winner(
        &self,
        provider: &str,
        canonical: &CanonicalIdentity,
    ) -> GuardResult<User> {
        let identity =
            IdentityRepo::find_by_provider_external(&self.pool, provider, &canonical.external_id)
                .await?
                .ok_or_else(|| {
                    GuardError::Core(CoreError::Internal(
                        "identity vanished after insert conflict".to_string(),
                    ))
                })?;
        self.refresh_linked(identity, canonical).await
    }

    async fn load_linked_user(&self, identity: &Identity) -> GuardResult<User> {
        UserRepo::find_by_id(&self.pool, identity.user_id).await?.ok_or_else(|| {
            tracing::warn!(identity_id = identity.id, user_id = identity.user_id,
                "Identity references a missing user");
            GuardError::Core(CoreError::Internal("identity references a missing user".to_string()))
        })
    }
}
