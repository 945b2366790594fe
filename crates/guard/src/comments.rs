//! Guarded comment operations: create, author edit, author delete.
//!
//! The create and edit pipelines run the full gauntlet in a fixed order:
//! standing checks (ban, mute), input validation, parent validation, the
//! rate limiter, then abuse scoring. The rate check sits before the scoring
//! queries so a limited request costs one round-trip, and only requests
//! that would otherwise proceed consume budget. Scoring recommendations are
//! applied here: review-band content stays visible and is queued via the
//! audit log, flag- and delete-band content is hidden as a soft delete with
//! the corresponding automated audit action.

use banter_core::abuse::{AbuseScore, Recommendation};
use banter_core::authz::{self, CommentModAction, ContentAction, DenyReason};
use banter_core::error::CoreError;
use banter_core::moderation::{
    comment_transition, target_kinds, CommentFlags, ACTION_AUTO_DELETE, ACTION_AUTO_FLAG,
    ACTION_AUTO_REVIEW,
};
use banter_core::ratelimit::ActionClass;
use banter_core::types::DbId;
use banter_db::models::comment::{Comment, CreateComment};
use banter_db::models::user::User;
use banter_db::repositories::{CommentRepo, UserRepo};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;

use crate::abuse::AbuseMonitor;
use crate::config::GuardConfig;
use crate::error::{GuardError, GuardResult};
use crate::moderation::ModerationEngine;
use crate::ratelimit::RateLimiter;
use crate::session::SessionContext;

/// Upper bound on comment body size, in bytes. Bounds the cost of the
/// pairwise similarity scan in scoring.
pub const MAX_CONTENT_LENGTH: usize = 10_000;

/// Input for a new comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub media_id: String,
    pub parent_id: Option<DbId>,
    pub content: String,
}

/// A stored comment plus the scoring verdict that accompanied the write.
///
/// When `recommendation` is `Flag` or `Delete`, `comment.deleted` is
/// already true.
#[derive(Debug)]
pub struct ScoredComment {
    pub comment: Comment,
    pub score: AbuseScore,
    pub recommendation: Recommendation,
}

/// Guarded comment operations.
#[derive(Clone)]
pub struct CommentService {
    pool: PgPool,
    limiter: RateLimiter,
    monitor: AbuseMonitor,
    engine: ModerationEngine,
}

impl CommentService {
    pub fn new(pool: PgPool, config: &GuardConfig) -> Self {
        let limiter = RateLimiter::new(pool.clone(), config);
        let monitor = AbuseMonitor::new(pool.clone(), config);
        let engine = ModerationEngine::new(pool.clone());
        Self { pool, limiter, monitor, engine }
    }

    /// Create a comment for the session's user.
    ///
    /// Replies must target a live parent: a missing parent is `NotFound`, a
    /// deleted or locked parent (or one on a different media item) is a
    /// validation failure before any write.
    pub async fn create(
        &self,
        actor: &SessionContext,
        input: &NewComment,
    ) -> GuardResult<ScoredComment> {
        let now = Utc::now();
        authz::authorize_content(ContentAction::CreateComment, actor.banned, actor.muted_until, now)
            .into_result()?;
        validate_content(&input.content)?;

        if let Some(parent_id) = input.parent_id {
            let parent = CommentRepo::find_by_id(&self.pool, parent_id)
                .await?
                .ok_or(CoreError::NotFound { entity: "comment", id: parent_id })?;
            if parent.deleted {
                return Err(validation("Cannot reply to a deleted comment"));
            }
            if parent.locked {
                return Err(validation("Cannot reply to a locked comment"));
            }
            if parent.media_id != input.media_id {
                return Err(validation("Reply must stay on its parent's media item"));
            }
        }

        self.limiter.check(actor.user_id, actor.role, ActionClass::Comment).await?.into_result()?;

        let author = self.load_author(actor.user_id).await?;
        let score = self.monitor.evaluate_comment(&author, &input.media_id, &input.content, now).await?;
        let recommendation = self.monitor.policy().recommendation(score.value);

        let comment = CommentRepo::create(
            &self.pool,
            &CreateComment {
                media_id: input.media_id.clone(),
                parent_id: input.parent_id,
                author_id: actor.user_id,
                content: input.content.clone(),
            },
        )
        .await?;
        tracing::debug!(comment_id = comment.id, author_id = actor.user_id, "Stored comment");

        let comment = self.apply_recommendation(comment, &score, recommendation).await?;
        Ok(ScoredComment { comment, score, recommendation })
    }

    /// Edit a comment's body. Author-only; deleted and locked comments
    /// cannot be edited. The new body is re-scored like a fresh post.
    pub async fn edit(
        &self,
        actor: &SessionContext,
        comment_id: DbId,
        new_content: &str,
    ) -> GuardResult<ScoredComment> {
        let now = Utc::now();
        authz::authorize_content(ContentAction::EditComment, actor.banned, actor.muted_until, now)
            .into_result()?;
        validate_content(new_content)?;

        let comment = CommentRepo::find_by_id(&self.pool, comment_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "comment", id: comment_id })?;
        if comment.author_id != actor.user_id {
            return Err(forbidden(DenyReason::NotAuthor));
        }
        if comment.deleted {
            return Err(conflict("Cannot edit a deleted comment"));
        }
        if comment.locked {
            return Err(conflict("Cannot edit a locked comment"));
        }

        self.limiter.check(actor.user_id, actor.role, ActionClass::Comment).await?.into_result()?;

        let author = self.load_author(actor.user_id).await?;
        let score = self.monitor.evaluate_comment(&author, &comment.media_id, new_content, now).await?;
        let recommendation = self.monitor.policy().recommendation(score.value);

        let updated = CommentRepo::update_content(&self.pool, comment_id, actor.user_id, new_content)
            .await?
            .ok_or_else(|| conflict("Comment changed concurrently; retry"))?;

        let updated = self.apply_recommendation(updated, &score, recommendation).await?;
        Ok(ScoredComment { comment: updated, score, recommendation })
    }

    /// Soft-delete the actor's own comment. Muted users keep this right;
    /// moderation deletes flow through the moderation engine instead.
    pub async fn delete_own(&self, actor: &SessionContext, comment_id: DbId) -> GuardResult<Comment> {
        let now = Utc::now();
        authz::authorize_content(
            ContentAction::DeleteOwnComment,
            actor.banned,
            actor.muted_until,
            now,
        )
        .into_result()?;

        let comment = CommentRepo::find_by_id(&self.pool, comment_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "comment", id: comment_id })?;
        if comment.author_id != actor.user_id {
            return Err(forbidden(DenyReason::NotAuthor));
        }

        let flags = flags_of(&comment);
        let next = comment_transition(flags, CommentModAction::Delete)?;
        let updated = CommentRepo::set_flags(&self.pool, comment_id, flags, next)
            .await?
            .ok_or_else(|| conflict("Comment changed concurrently; retry"))?;

        self.engine
            .audit(
                actor.user_id,
                CommentModAction::Delete.as_str(),
                target_kinds::COMMENT,
                comment_id,
                None,
                Some(json!({ "own": true })),
            )
            .await?;
        tracing::info!(comment_id, author_id = actor.user_id, "Author deleted own comment");
        Ok(updated)
    }

    /// Hide or queue a comment per the scoring recommendation, auditing the
    /// automated action under the author's id.
    async fn apply_recommendation(
        &self,
        comment: Comment,
        score: &AbuseScore,
        recommendation: Recommendation,
    ) -> GuardResult<Comment> {
        let details = json!({ "score": score.value, "flags": score.flags });
        match recommendation {
            Recommendation::None => Ok(comment),
            Recommendation::Review => {
                self.engine
                    .audit(
                        comment.author_id,
                        ACTION_AUTO_REVIEW,
                        target_kinds::COMMENT,
                        comment.id,
                        None,
                        Some(details),
                    )
                    .await?;
                tracing::info!(comment_id = comment.id, score = score.value,
                    "Comment queued for review");
                Ok(comment)
            }
            Recommendation::Flag | Recommendation::Delete => {
                let action = if recommendation == Recommendation::Delete {
                    ACTION_AUTO_DELETE
                } else {
                    ACTION_AUTO_FLAG
                };
                let flags = flags_of(&comment);
                let hidden = CommentFlags { deleted: true, ..flags };
                let updated = CommentRepo::set_flags(&self.pool, comment.id, flags, hidden)
                    .await?
                    .ok_or_else(|| conflict("Comment changed concurrently; retry"))?;
                self.engine
                    .audit(comment.author_id, action, target_kinds::COMMENT, comment.id, None,
                        Some(details))
                    .await?;
                tracing::warn!(comment_id = comment.id, author_id = comment.author_id,
                    score = score.value, action, "Hid comment on abuse score");
                Ok(updated)
            }
        }
    }

    async fn load_author(&self, user_id: DbId) -> GuardResult<User> {
        UserRepo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| GuardError::Core(CoreError::NotFound { entity: "user", id: user_id }))
    }
}

fn flags_of(comment: &Comment) -> CommentFlags {
    CommentFlags { deleted: comment.deleted, locked: comment.locked, pinned: comment.pinned }
}

fn validate_content(content: &str) -> GuardResult<()> {
    if content.trim().is_empty() {
        return Err(validation("Comment content must not be empty"));
    }
    if content.len() > MAX_CONTENT_LENGTH {
        return Err(GuardError::Core(CoreError::Validation(format!(
            "Comment content exceeds maximum length of {MAX_CONTENT_LENGTH} bytes (got {})",
            content.len()
        ))));
    }
    Ok(())
}

fn validation(message: &str) -> GuardError {
    GuardError::Core(CoreError::Validation(message.to_string()))
}

fn conflict(message: &str) -> GuardError {
    GuardError::Core(CoreError::Conflict(message.to_string()))
}

fn forbidden(reason: DenyReason) -> GuardError {
    GuardError::Core(CoreError::Forbidden(reason.as_str().to_string()))
}
