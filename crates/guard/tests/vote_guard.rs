//! Guarded vote operation tests.
//!
//! Covers [`VoteService`] against a real database:
//! - Cast, flip, and re-cast semantics on the single vote row
//! - Self-vote rejection ahead of rate accounting
//! - Unmetered, idempotent removal
//! - Churn and young-cohort detection flagging a comment without hiding it

use assert_matches::assert_matches;
use banter_core::abuse::{flags, Recommendation};
use banter_core::error::CoreError;
use banter_core::moderation::CommentFlags;
use banter_core::ratelimit::RateQuota;
use banter_db::models::comment::{Comment, CreateComment};
use banter_db::models::user::{CreateUser, User};
use banter_db::repositories::{CommentRepo, ModerationLogRepo, UserRepo, VoteRepo};
use banter_guard::{GuardConfig, GuardError, SessionContext, VoteService};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, name: &str) -> User {
    UserRepo::create(pool, &CreateUser { display_name: name.to_string() })
        .await
        .unwrap()
}

fn context_for(user: &User) -> SessionContext {
    SessionContext {
        session_id: 0,
        user_id: user.id,
        role: user.role().unwrap(),
        banned: user.banned,
        shadow_banned: user.shadow_banned,
        muted_until: user.muted_until,
    }
}

async fn seed_comment(pool: &PgPool, author_id: i64, media_id: &str) -> Comment {
    CommentRepo::create(
        pool,
        &CreateComment {
            media_id: media_id.to_string(),
            parent_id: None,
            author_id,
            content: "worth discussing".to_string(),
        },
    )
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// Casting
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cast_flip_and_recast(pool: PgPool) {
    let svc = VoteService::new(pool.clone(), &GuardConfig::default());
    let author = seed_user(&pool, "author").await;
    let voter = seed_user(&pool, "voter").await;
    let comment = seed_comment(&pool, author.id, "show-1").await;
    let actor = context_for(&voter);

    let first = svc.cast(&actor, comment.id, 1).await.unwrap();
    assert_eq!(first.vote.vote_type, 1);
    assert_eq!(first.vote.reversal_count, 0);
    assert_eq!(first.recommendation, Recommendation::None);

    let flipped = svc.cast(&actor, comment.id, -1).await.unwrap();
    assert_eq!(flipped.vote.vote_type, -1);
    assert_eq!(flipped.vote.reversal_count, 1);

    let recast = svc.cast(&actor, comment.id, -1).await.unwrap();
    assert_eq!(recast.vote.reversal_count, 1, "same direction is not a reversal");

    let stored = VoteRepo::find_by_comment_and_user(&pool, comment.id, voter.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.vote_type, -1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_vote_type_is_validated(pool: PgPool) {
    let svc = VoteService::new(pool.clone(), &GuardConfig::default());
    let author = seed_user(&pool, "author").await;
    let voter = seed_user(&pool, "voter").await;
    let comment = seed_comment(&pool, author.id, "show-1").await;
    let actor = context_for(&voter);

    for bad in [0i16, 2, -2] {
        let err = svc.cast(&actor, comment.id, bad).await.unwrap_err();
        assert_matches!(err, GuardError::Core(CoreError::Validation(_)), "vote_type {bad}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_self_vote_is_rejected_before_rate_accounting(pool: PgPool) {
    let mut config = GuardConfig::default();
    config.rate_limits.vote = RateQuota { max_requests: 1, window_secs: 3600 };
    let svc = VoteService::new(pool.clone(), &config);

    let author = seed_user(&pool, "author").await;
    let other = seed_user(&pool, "other").await;
    let own = seed_comment(&pool, author.id, "show-1").await;
    let theirs = seed_comment(&pool, other.id, "show-1").await;
    let actor = context_for(&author);

    // Burn the entire vote budget first.
    svc.cast(&actor, theirs.id, 1).await.unwrap();

    // Ownership is checked ahead of the limiter, so the answer is self_vote,
    // not a retry hint.
    let err = svc.cast(&actor, own.id, 1).await.unwrap_err();
    assert_matches!(err, GuardError::Core(CoreError::Forbidden(reason)) if reason == "self_vote");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_vote_requires_a_live_comment(pool: PgPool) {
    let svc = VoteService::new(pool.clone(), &GuardConfig::default());
    let author = seed_user(&pool, "author").await;
    let voter = seed_user(&pool, "voter").await;
    let actor = context_for(&voter);

    let err = svc.cast(&actor, 999_999, 1).await.unwrap_err();
    assert_matches!(err, GuardError::Core(CoreError::NotFound { entity: "comment", .. }));

    let gone = seed_comment(&pool, author.id, "show-1").await;
    CommentRepo::set_flags(
        &pool,
        gone.id,
        CommentFlags::default(),
        CommentFlags { deleted: true, ..Default::default() },
    )
    .await
    .unwrap();
    let err = svc.cast(&actor, gone.id, 1).await.unwrap_err();
    assert_matches!(err, GuardError::Core(CoreError::Validation(_)));

    // Locking stops replies, not votes.
    let locked = seed_comment(&pool, author.id, "show-1").await;
    CommentRepo::set_flags(
        &pool,
        locked.id,
        CommentFlags::default(),
        CommentFlags { locked: true, ..Default::default() },
    )
    .await
    .unwrap();
    assert!(svc.cast(&actor, locked.id, 1).await.is_ok());
}

// ---------------------------------------------------------------------------
// Removal
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_remove_vote_is_idempotent_and_unmetered(pool: PgPool) {
    let mut config = GuardConfig::default();
    config.rate_limits.vote = RateQuota { max_requests: 1, window_secs: 3600 };
    let svc = VoteService::new(pool.clone(), &config);

    let author = seed_user(&pool, "author").await;
    let voter = seed_user(&pool, "voter").await;
    let comment = seed_comment(&pool, author.id, "show-1").await;
    let actor = context_for(&voter);

    svc.cast(&actor, comment.id, 1).await.unwrap();

    // Removal works with an empty budget and reports whether a row went away.
    assert!(svc.remove(&actor, comment.id).await.unwrap());
    assert!(!svc.remove(&actor, comment.id).await.unwrap());
    assert!(VoteRepo::find_by_comment_and_user(&pool, comment.id, voter.id)
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Vote-abuse detection
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_vote_churn_flags_the_comment_without_hiding_it(pool: PgPool) {
    let svc = VoteService::new(pool.clone(), &GuardConfig::default());
    let author = seed_user(&pool, "author").await;
    let churner = seed_user(&pool, "churner").await;
    let comment = seed_comment(&pool, author.id, "show-1").await;
    let actor = context_for(&churner);

    svc.cast(&actor, comment.id, 1).await.unwrap();
    svc.cast(&actor, comment.id, -1).await.unwrap();
    svc.cast(&actor, comment.id, 1).await.unwrap();
    let third_flip = svc.cast(&actor, comment.id, -1).await.unwrap();
    assert_eq!(third_flip.vote.reversal_count, 3);
    assert_eq!(third_flip.recommendation, Recommendation::None, "three cycles is the tolerance");

    let fourth_flip = svc.cast(&actor, comment.id, 1).await.unwrap();
    assert_eq!(fourth_flip.vote.reversal_count, 4);
    assert_eq!(fourth_flip.recommendation, Recommendation::Flag);
    assert!(fourth_flip.score.has_flag(flags::VOTE_CHURN));

    // The comment belongs to the victim, so it stays visible; the flag goes
    // to the audit log for a moderator.
    let stored = CommentRepo::find_by_id(&pool, comment.id).await.unwrap().unwrap();
    assert!(!stored.deleted);
    let entries = ModerationLogRepo::list_for_target(&pool, "comment", comment.id, 10)
        .await
        .unwrap();
    let entry = entries.first().expect("churn should be audited");
    assert_eq!(entry.action, "vote_flag");
    assert_eq!(entry.actor_id, churner.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_young_cohort_brigade_is_flagged(pool: PgPool) {
    let svc = VoteService::new(pool.clone(), &GuardConfig::default());
    let author = seed_user(&pool, "author").await;
    let comment = seed_comment(&pool, author.id, "show-1").await;

    let mut last = None;
    for i in 0..5 {
        let voter = seed_user(&pool, &format!("fresh-{i}")).await;
        last = Some(svc.cast(&context_for(&voter), comment.id, 1).await.unwrap());
        if i == 3 {
            assert_eq!(
                last.as_ref().unwrap().recommendation,
                Recommendation::None,
                "four young votes stay under the cohort bound"
            );
        }
    }

    let fifth = last.unwrap();
    assert_eq!(fifth.recommendation, Recommendation::Flag);
    assert!(fifth.score.has_flag(flags::COHORT_VOTING));

    let stored = CommentRepo::find_by_id(&pool, comment.id).await.unwrap().unwrap();
    assert!(!stored.deleted, "brigaded comments are never hidden by the detector");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_super_admin_votes_are_exempt_from_quota(pool: PgPool) {
    let mut config = GuardConfig::default();
    config.rate_limits.vote = RateQuota { max_requests: 1, window_secs: 3600 };
    let svc = VoteService::new(pool.clone(), &config);

    let author = seed_user(&pool, "author").await;
    let root = seed_user(&pool, "root").await;
    UserRepo::set_role(&pool, root.id, "super_admin").await.unwrap();
    let root = UserRepo::find_by_id(&pool, root.id).await.unwrap().unwrap();

    let first = seed_comment(&pool, author.id, "show-1").await;
    let second = seed_comment(&pool, author.id, "show-2").await;
    let actor = context_for(&root);

    assert!(svc.cast(&actor, first.id, 1).await.is_ok());
    assert!(svc.cast(&actor, second.id, 1).await.is_ok());
}
