//! Moderation engine: authorized, audited state transitions on users and
//! comments.
//!
//! Every applied transition follows the same shape: load the target,
//! authorize the actor against it, validate the transition with the pure
//! rules in `banter_core::moderation`, apply it as one atomic statement,
//! and append a `moderation_log` entry. A compare-and-set failure after
//! validation means a concurrent moderator got there first and surfaces as
//! `Conflict`, never as a double-applied transition.

use banter_core::authz::{self, CommentModAction, UserModAction};
use banter_core::error::CoreError;
use banter_core::moderation::{self, target_kinds, CommentFlags, ACTION_UNMUTE};
use banter_core::types::DbId;
use banter_db::models::comment::Comment;
use banter_db::models::moderation_log::CreateLogEntry;
use banter_db::models::user::User;
use banter_db::repositories::{CommentRepo, ModerationLogRepo, SessionRepo, UserRepo};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;

use crate::error::{GuardError, GuardResult};
use crate::session::SessionContext;

/// Applies user- and comment-directed moderation actions.
#[derive(Clone)]
pub struct ModerationEngine {
    pool: PgPool,
}

impl ModerationEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply a user-directed moderation action and return the updated
    /// target.
    ///
    /// `mute_hours` is only meaningful for [`UserModAction::Mute`]: `None`
    /// applies the default duration and `Some(0)` is an explicit unmute
    /// (audited as such). Banning additionally revokes every live session
    /// the target owns.
    pub async fn moderate_user(
        &self,
        actor: &SessionContext,
        target_id: DbId,
        action: UserModAction,
        reason: Option<&str>,
        mute_hours: Option<i64>,
    ) -> GuardResult<User> {
        if mute_hours.is_some() && action != UserModAction::Mute {
            return Err(GuardError::Core(CoreError::Validation(
                "A duration argument is only valid for mute".to_string(),
            )));
        }

        let target = UserRepo::find_by_id(&self.pool, target_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "user", id: target_id })?;
        let target_role = target.role()?;

        authz::authorize_user_moderation(actor.user_id, actor.role, target_id, target_role, action)
            .into_result()?;

        let (log_action, details) = match action {
            UserModAction::Warn => (action.as_str(), None),

            UserModAction::Mute => {
                let until = moderation::mute_expiry(Utc::now(), mute_hours)?;
                UserRepo::set_muted_until(&self.pool, target_id, until).await?;
                let log_action = if until.is_none() { ACTION_UNMUTE } else { action.as_str() };
                (log_action, Some(json!({ "muted_until": until })))
            }

            UserModAction::Ban | UserModAction::Unban => {
                let set = action == UserModAction::Ban;
                moderation::toggle_ban_flag("banned", target.banned, set)?;
                if !UserRepo::set_banned(&self.pool, target_id, set).await? {
                    return Err(concurrent_conflict("Ban state"));
                }
                if set {
                    let revoked = SessionRepo::delete_all_for_user(&self.pool, target_id).await?;
                    tracing::info!(user_id = target_id, revoked, "Revoked sessions on ban");
                    (action.as_str(), Some(json!({ "sessions_revoked": revoked })))
                } else {
                    (action.as_str(), None)
                }
            }

            UserModAction::ShadowBan | UserModAction::UnshadowBan => {
                let set = action == UserModAction::ShadowBan;
                moderation::toggle_ban_flag("shadow_banned", target.shadow_banned, set)?;
                if !UserRepo::set_shadow_banned(&self.pool, target_id, set).await? {
                    return Err(concurrent_conflict("Shadow-ban state"));
                }
                (action.as_str(), None)
            }

            UserModAction::Promote | UserModAction::Demote => {
                let next = if action == UserModAction::Promote {
                    moderation::promote_target(target_role)?
                } else {
                    moderation::demote_target(target_role)?
                };
                if !UserRepo::set_role(&self.pool, target_id, next.as_str()).await? {
                    return Err(concurrent_conflict("Role"));
                }
                (
                    action.as_str(),
                    Some(json!({ "from": target_role.as_str(), "to": next.as_str() })),
                )
            }
        };

        self.audit(actor.user_id, log_action, target_kinds::USER, target_id, reason, details)
            .await?;
        tracing::info!(actor_id = actor.user_id, target_id, action = log_action,
            "Applied user moderation");

        UserRepo::find_by_id(&self.pool, target_id).await?.ok_or_else(|| {
            GuardError::Core(CoreError::NotFound { entity: "user", id: target_id })
        })
    }

    /// Apply a comment-directed moderation action and return the updated
    /// comment.
    ///
    /// `tag` is required for tag actions and invalid for everything else.
    pub async fn moderate_comment(
        &self,
        actor: &SessionContext,
        comment_id: DbId,
        action: CommentModAction,
        reason: Option<&str>,
        tag: Option<&str>,
    ) -> GuardResult<Comment> {
        let comment = CommentRepo::find_by_id(&self.pool, comment_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "comment", id: comment_id })?;
        let author = UserRepo::find_by_id(&self.pool, comment.author_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "user", id: comment.author_id })?;
        let author_role = author.role()?;

        authz::authorize_comment_moderation(actor.role, author_role, action).into_result()?;

        let is_tag_action = matches!(action, CommentModAction::AddTag | CommentModAction::RemoveTag);
        let (updated, details) = if is_tag_action {
            let tag = tag.ok_or_else(|| {
                CoreError::Validation("Tag actions require a tag argument".to_string())
            })?;
            let next = moderation::apply_tag(&comment.tags, tag, action == CommentModAction::AddTag)?;
            let updated = CommentRepo::set_tags(&self.pool, comment_id, &next)
                .await?
                .ok_or(CoreError::NotFound { entity: "comment", id: comment_id })?;
            (updated, Some(json!({ "tag": tag })))
        } else {
            if tag.is_some() {
                return Err(GuardError::Core(CoreError::Validation(
                    "A tag argument is only valid for tag actions".to_string(),
                )));
            }
            let flags = CommentFlags {
                deleted: comment.deleted,
                locked: comment.locked,
                pinned: comment.pinned,
            };
            let next = moderation::comment_transition(flags, action)?;
            let updated = CommentRepo::set_flags(&self.pool, comment_id, flags, next)
                .await?
                .ok_or_else(|| concurrent_conflict("Comment flags"))?;
            (updated, None)
        };

        self.audit(actor.user_id, action.as_str(), target_kinds::COMMENT, comment_id, reason, details)
            .await?;
        tracing::info!(actor_id = actor.user_id, comment_id, action = action.as_str(),
            "Applied comment moderation");

        Ok(updated)
    }

    /// Append one audit entry. Shared by the services that apply automated
    /// transitions (auto-flag, auto-delete, vote-flag) as well.
    pub(crate) async fn audit(
        &self,
        actor_id: DbId,
        action: &str,
        target_kind: &str,
        target_id: DbId,
        reason: Option<&str>,
        details: Option<serde_json::Value>,
    ) -> GuardResult<()> {
        ModerationLogRepo::create(
            &self.pool,
            &CreateLogEntry {
                actor_id,
                action: action.to_string(),
                target_kind: target_kind.to_string(),
                target_id,
                reason: reason.map(str::to_string),
                details,
            },
        )
        .await?;
        Ok(())
    }
}

fn concurrent_conflict(what: &str) -> GuardError {
    GuardError::Core(CoreError::Conflict(format!("{what} changed concurrently; retry")))
}
