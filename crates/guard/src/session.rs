//! Session issuance, validation, and revocation.
//!
//! The opaque bearer token is the only source of identity after issuance;
//! nothing here ever trusts a caller-supplied user id. Plaintext tokens
//! exist in memory for the duration of the issuing call and are returned to
//! the caller exactly once; storage and logs only ever see the SHA-256 hash
//! and the eight-character prefix.

use banter_core::authz::DenyReason;
use banter_core::error::CoreError;
use banter_core::roles::Role;
use banter_core::tokens;
use banter_core::types::{DbId, Timestamp};
use banter_db::models::session::CreateSession;
use banter_db::repositories::{SessionRepo, UserRepo};
use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::config::GuardConfig;
use crate::error::{GuardError, GuardResult};

/// Trusted per-request identity, produced only by [`SessionManager::validate`].
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: DbId,
    pub user_id: DbId,
    pub role: Role,
    pub banned: bool,
    pub shadow_banned: bool,
    pub muted_until: Option<Timestamp>,
}

/// A freshly issued session. `token` is the plaintext; it is not recoverable
/// after this value is dropped.
#[derive(Debug)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: Timestamp,
}

/// Issues, validates, and revokes sessions against the shared store.
#[derive(Clone)]
pub struct SessionManager {
    pool: PgPool,
    ttl_days: i64,
}

impl SessionManager {
    pub fn new(pool: PgPool, config: &GuardConfig) -> Self {
        Self { pool, ttl_days: config.session_ttl_days }
    }

    /// Issue a new session for `user_id`, returning the plaintext token
    /// exactly once.
    pub async fn issue(&self, user_id: DbId, provider: &str) -> GuardResult<IssuedSession> {
        let generated = tokens::generate_token();
        let expires_at = Utc::now() + Duration::days(self.ttl_days);

        SessionRepo::create(
            &self.pool,
            &CreateSession {
                token_hash: generated.hash,
                token_prefix: generated.prefix.clone(),
                user_id,
                provider: provider.to_string(),
                expires_at,
            },
        )
        .await?;

        tracing::info!(user_id, provider, token_prefix = %generated.prefix, "Issued session");
        Ok(IssuedSession { token: generated.plaintext, expires_at })
    }

    /// Resolve a plaintext token to a trusted [`SessionContext`].
    ///
    /// Fails `Unauthenticated` for an unknown token and for an expired one
    /// (deleting the lapsed row on the way out), and `Forbidden(banned)`
    /// when the owning account is banned. `last_used_at` is bumped
    /// monotonically on success.
    pub async fn validate(&self, token: &str) -> GuardResult<SessionContext> {
        let hash = tokens::hash_token(token);
        let prefix = tokens::token_prefix(token);

        let Some(session) = SessionRepo::find_by_token_hash(&self.pool, &hash).await? else {
            tracing::debug!(token_prefix = %prefix, "Unknown session token");
            return Err(unauthenticated("unknown session token"));
        };

        let now = Utc::now();
        if session.expires_at <= now {
            SessionRepo::delete_by_id(&self.pool, session.id).await?;
            tracing::debug!(token_prefix = %prefix, user_id = session.user_id, "Session expired");
            return Err(unauthenticated("session expired"));
        }

        let Some(user) = UserRepo::find_by_id(&self.pool, session.user_id).await? else {
            // The sessions FK cascades on user deletion, so this is a torn
            // read; treat it like an unknown token.
            tracing::warn!(session_id = session.id, user_id = session.user_id,
                "Session references a missing user");
            return Err(unauthenticated("unknown session token"));
        };

        if user.banned {
            tracing::warn!(user_id = user.id, "Banned account presented a live session");
            return Err(GuardError::Core(CoreError::Forbidden(
                DenyReason::Banned.as_str().to_string(),
            )));
        }

        let role = user.role()?;
        SessionRepo::touch_last_used(&self.pool, session.id).await?;

        Ok(SessionContext {
            session_id: session.id,
            user_id: user.id,
            role,
            banned: user.banned,
            shadow_banned: user.shadow_banned,
            muted_until: user.muted_until,
        })
    }

    /// Revoke the session behind a plaintext token. Idempotent: revoking an
    /// unknown or already-revoked token succeeds quietly.
    pub async fn revoke(&self, token: &str) -> GuardResult<()> {
        let hash = tokens::hash_token(token);
        let deleted = SessionRepo::delete_by_token_hash(&self.pool, &hash).await?;
        if deleted {
            tracing::info!(token_prefix = %tokens::token_prefix(token), "Revoked session");
        } else {
            tracing::debug!(token_prefix = %tokens::token_prefix(token),
                "Revoke on unknown session token");
        }
        Ok(())
    }

    /// Revoke every session owned by `user_id`, returning the count. Run on
    /// ban so a banned account cannot keep using live sessions.
    pub async fn revoke_all_for_user(&self, user_id: DbId) -> GuardResult<u64> {
        let revoked = SessionRepo::delete_all_for_user(&self.pool, user_id).await?;
        if revoked > 0 {
            tracing::info!(user_id, revoked, "Revoked all sessions for user");
        }
        Ok(revoked)
    }
}

fn unauthenticated(reason: &str) -> GuardError {
    GuardError::Core(CoreError::Unauthenticated(reason.to_string()))
}
