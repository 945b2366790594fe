//! Guarded vote operations.
//!
//! One vote per `(comment, user)`; casting again with the other direction
//! flips the stored row in place via a single upsert, which also maintains
//! the reversal streak the churn heuristic reads. Self-votes are rejected
//! outright before the rate limiter or any scoring runs. Vote removal is
//! free: it consumes no budget and is idempotent.

use banter_core::abuse::{AbuseScore, Recommendation};
use banter_core::authz::{self, ContentAction, DenyReason};
use banter_core::error::CoreError;
use banter_core::moderation::{target_kinds, ACTION_VOTE_FLAG};
use banter_core::ratelimit::ActionClass;
use banter_core::types::DbId;
use banter_db::models::vote::Vote;
use banter_db::repositories::{CommentRepo, VoteRepo};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;

use crate::abuse::AbuseMonitor;
use crate::config::GuardConfig;
use crate::error::{GuardError, GuardResult};
use crate::moderation::ModerationEngine;
use crate::ratelimit::RateLimiter;
use crate::session::SessionContext;

/// An applied vote plus the vote-abuse verdict computed after it.
///
/// A `Flag` recommendation queues the comment for moderator review via the
/// audit log; the comment itself stays visible, since the suspect behavior
/// belongs to the voters, not the author.
#[derive(Debug)]
pub struct ScoredVote {
    pub vote: Vote,
    pub score: AbuseScore,
    pub recommendation: Recommendation,
}

/// Guarded vote operations.
#[derive(Clone)]
pub struct VoteService {
    pool: PgPool,
    limiter: RateLimiter,
    monitor: AbuseMonitor,
    engine: ModerationEngine,
}

impl VoteService {
    pub fn new(pool: PgPool, config: &GuardConfig) -> Self {
        let limiter = RateLimiter::new(pool.clone(), config);
        let monitor = AbuseMonitor::new(pool.clone(), config);
        let engine = ModerationEngine::new(pool.clone());
        Self { pool, limiter, monitor, engine }
    }

    /// Cast or change a vote on a comment.
    pub async fn cast(
        &self,
        actor: &SessionContext,
        comment_id: DbId,
        vote_type: i16,
    ) -> GuardResult<ScoredVote> {
        if vote_type != 1 && vote_type != -1 {
            return Err(GuardError::Core(CoreError::Validation(format!(
                "Vote type must be 1 (up) or -1 (down), got {vote_type}"
            ))));
        }

        let now = Utc::now();
        authz::authorize_content(ContentAction::CastVote, actor.banned, actor.muted_until, now)
            .into_result()?;

        let comment = CommentRepo::find_by_id(&self.pool, comment_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "comment", id: comment_id })?;
        if comment.deleted {
            return Err(GuardError::Core(CoreError::Validation(
                "Cannot vote on a deleted comment".to_string(),
            )));
        }
        if comment.author_id == actor.user_id {
            return Err(GuardError::Core(CoreError::Forbidden(
                DenyReason::SelfVote.as_str().to_string(),
            )));
        }

        self.limiter.check(actor.user_id, actor.role, ActionClass::Vote).await?.into_result()?;

        let vote = VoteRepo::upsert(
            &self.pool,
            comment_id,
            actor.user_id,
            vote_type,
            self.monitor.policy().vote_churn_window_secs as f64,
        )
        .await?;

        let score = self.monitor.evaluate_vote(&vote, now).await?;
        let recommendation = self.monitor.policy().vote_recommendation(score.value);

        if recommendation == Recommendation::Flag {
            self.engine
                .audit(
                    actor.user_id,
                    ACTION_VOTE_FLAG,
                    target_kinds::COMMENT,
                    comment_id,
                    None,
                    Some(json!({ "score": score.value, "flags": score.flags })),
                )
                .await?;
            tracing::warn!(comment_id, voter_id = actor.user_id, score = score.value,
                "Flagged comment for vote-abuse review");
        }

        Ok(ScoredVote { vote, score, recommendation })
    }

    /// Remove the actor's vote on a comment, if any. Returns whether a vote
    /// was removed; removing an absent vote is not an error and consumes no
    /// rate budget.
    pub async fn remove(&self, actor: &SessionContext, comment_id: DbId) -> GuardResult<bool> {
        let now = Utc::now();
        authz::authorize_content(ContentAction::RemoveVote, actor.banned, actor.muted_until, now)
            .into_result()?;

        let removed = VoteRepo::delete(&self.pool, comment_id, actor.user_id).await?;
        tracing::debug!(comment_id, voter_id = actor.user_id, removed, "Vote removal");
        Ok(removed)
    }
}
