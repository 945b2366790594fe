//! Storage-backed input gathering for the pure abuse scorer.
//!
//! The scorer itself lives in `banter_core::abuse` and never touches
//! storage; this monitor assembles its inputs (trailing counts, recent
//! bodies, vote cohorts) from the repositories and hands back the score
//! untouched. Scoring never mutates state; acting on a recommendation is
//! the calling service's job.

use banter_core::abuse::{
    self, AbuseInput, AbusePolicy, AbuseScore, BehaviorSnapshot, VoteActivity,
};
use banter_core::types::Timestamp;
use banter_db::models::user::User;
use banter_db::models::vote::Vote;
use banter_db::repositories::{CommentRepo, ReportRepo, VoteRepo};
use chrono::Duration;
use sqlx::PgPool;

use crate::config::GuardConfig;
use crate::error::GuardResult;

/// Seconds in the trailing window behind the comment-burst signal.
const BURST_WINDOW_SECS: f64 = 3600.0;

/// Gathers abuse-scoring inputs from storage and evaluates them.
#[derive(Clone)]
pub struct AbuseMonitor {
    pool: PgPool,
    policy: AbusePolicy,
}

impl AbuseMonitor {
    pub fn new(pool: PgPool, config: &GuardConfig) -> Self {
        Self { pool, policy: config.abuse_policy.clone() }
    }

    pub fn policy(&self) -> &AbusePolicy {
        &self.policy
    }

    /// Score a comment body the author is about to post or has just edited.
    pub async fn evaluate_comment(
        &self,
        author: &User,
        media_id: &str,
        content: &str,
        now: Timestamp,
    ) -> GuardResult<AbuseScore> {
        let comments_last_hour =
            CommentRepo::count_recent_by_author(&self.pool, author.id, BURST_WINDOW_SECS).await?;
        let total_comments = CommentRepo::count_total_by_author(&self.pool, author.id).await?;
        let reports_received = ReportRepo::count_against_author(&self.pool, author.id).await?;
        let same_media_recent = CommentRepo::count_recent_on_media(
            &self.pool,
            author.id,
            media_id,
            self.policy.media_flood_window_secs as f64,
        )
        .await?;
        let recent_comments = CommentRepo::recent_contents_by_author(
            &self.pool,
            author.id,
            self.policy.duplicate_lookback,
        )
        .await?;

        let behavior = BehaviorSnapshot {
            comments_last_hour,
            total_comments,
            reports_received,
            account_created_at: author.created_at,
        };
        let input = AbuseInput {
            content,
            behavior: &behavior,
            recent_comments: &recent_comments,
            same_media_recent,
        };

        let score = abuse::evaluate(&input, &self.policy, now);
        if !score.flags.is_empty() {
            tracing::debug!(author_id = author.id, score = score.value, flags = ?score.flags,
                "Content abuse signals fired");
        }
        Ok(score)
    }

    /// Score the voting activity around a just-applied vote.
    ///
    /// The stored reversal streak only resets lazily, on the next direction
    /// flip; a streak whose last flip predates the churn window has already
    /// subsided and scores as zero.
    pub async fn evaluate_vote(&self, vote: &Vote, now: Timestamp) -> GuardResult<AbuseScore> {
        let churn_cutoff = now - Duration::seconds(self.policy.vote_churn_window_secs);
        let reversal_count = match vote.last_reversed_at {
            Some(flipped_at) if flipped_at > churn_cutoff => vote.reversal_count,
            _ => 0,
        };

        let young_cohort_votes = VoteRepo::count_votes_from_young_accounts(
            &self.pool,
            vote.comment_id,
            self.policy.cohort_age_hours as f64 * 3600.0,
        )
        .await?;

        let activity = VoteActivity { reversal_count, young_cohort_votes };
        let score = abuse::evaluate_votes(&activity, &self.policy);
        if !score.flags.is_empty() {
            tracing::debug!(comment_id = vote.comment_id, voter_id = vote.user_id,
                score = score.value, flags = ?score.flags, "Vote abuse signals fired");
        }
        Ok(score)
    }
}
