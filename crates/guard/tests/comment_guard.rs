//! Guarded comment operation tests.
//!
//! Covers the create/edit/delete path through [`CommentService`]:
//! - Threading rules for replies (live parent, same media, not locked)
//! - Ban and mute enforcement, including mute lapse by timestamp
//! - Per-class rate budgets staying independent of each other
//! - Author-only edits with re-scoring, and self-service deletion

use assert_matches::assert_matches;
use banter_core::abuse::{flags, Recommendation};
use banter_core::error::CoreError;
use banter_core::moderation::CommentFlags;
use banter_core::ratelimit::RateQuota;
use banter_db::models::user::{CreateUser, User};
use banter_db::repositories::{CommentRepo, ModerationLogRepo, UserRepo};
use banter_guard::{
    CommentService, GuardConfig, GuardError, NewComment, SessionContext, VoteService,
};
use chrono::{Duration, Utc};
use serde_json::json;
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

fn new_comment(media_id: &str, content: &str) -> NewComment {
    NewComment {
        media_id: media_id.to_string(),
        parent_id: None,
        content: content.to_string(),
    }
}

fn reply_to(media_id: &str, parent_id: i64, content: &str) -> NewComment {
    NewComment {
        media_id: media_id.to_string(),
        parent_id: Some(parent_id),
        content: content.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Creation and threading
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_and_reply_happy_path(pool: PgPool) {
    let svc = CommentService::new(pool.clone(), &GuardConfig::default());
    let author = seed_user(&pool, "poster").await;
    let replier = seed_user(&pool, "replier").await;

    let scored = svc
        .create(&context_for(&author), &new_comment("show-101", "solid opener"))
        .await
        .unwrap();
    assert_eq!(scored.comment.author_id, author.id);
    assert_eq!(scored.recommendation, Recommendation::None);
    assert!(!scored.comment.deleted);

    let reply = svc
        .create(&context_for(&replier), &reply_to("show-101", scored.comment.id, "agreed"))
        .await
        .unwrap();
    assert_eq!(reply.comment.parent_id, Some(scored.comment.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reply_target_rules(pool: PgPool) {
    let svc = CommentService::new(pool.clone(), &GuardConfig::default());
    let author = seed_user(&pool, "threader").await;
    let actor = context_for(&author);

    let live = svc.create(&actor, &new_comment("show-a", "thread root")).await.unwrap().comment;
    let locked = svc.create(&actor, &new_comment("show-a", "locked root")).await.unwrap().comment;
    let gone = svc.create(&actor, &new_comment("show-a", "doomed root")).await.unwrap().comment;
    CommentRepo::set_flags(
        &pool,
        locked.id,
        CommentFlags::default(),
        CommentFlags { locked: true, ..Default::default() },
    )
    .await
    .unwrap();
    CommentRepo::set_flags(
        &pool,
        gone.id,
        CommentFlags::default(),
        CommentFlags { deleted: true, ..Default::default() },
    )
    .await
    .unwrap();

    let err = svc
        .create(&actor, &reply_to("show-a", 999_999, "into the void"))
        .await
        .unwrap_err();
    assert_matches!(err, GuardError::Core(CoreError::NotFound { entity: "comment", .. }));

    let err = svc
        .create(&actor, &reply_to("show-b", live.id, "wrong thread"))
        .await
        .unwrap_err();
    assert_matches!(err, GuardError::Core(CoreError::Validation(_)));

    let err = svc
        .create(&actor, &reply_to("show-a", locked.id, "too late"))
        .await
        .unwrap_err();
    assert_matches!(err, GuardError::Core(CoreError::Validation(_)));

    let err = svc
        .create(&actor, &reply_to("show-a", gone.id, "necro"))
        .await
        .unwrap_err();
    assert_matches!(err, GuardError::Core(CoreError::Validation(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_banned_and_muted_users_cannot_post(pool: PgPool) {
    let svc = CommentService::new(pool.clone(), &GuardConfig::default());
    let user = seed_user(&pool, "restricted").await;

    let mut actor = context_for(&user);
    actor.banned = true;
    let err = svc.create(&actor, &new_comment("show-1", "hello")).await.unwrap_err();
    assert_matches!(err, GuardError::Core(CoreError::Forbidden(reason)) if reason == "banned");

    let mut actor = context_for(&user);
    actor.muted_until = Some(Utc::now() + Duration::hours(1));
    let err = svc.create(&actor, &new_comment("show-1", "hello")).await.unwrap_err();
    assert_matches!(err, GuardError::Core(CoreError::Forbidden(reason)) if reason == "muted");

    // A lapsed mute needs no unmute action; the timestamp alone decides.
    actor.muted_until = Some(Utc::now() - Duration::minutes(1));
    assert!(svc.create(&actor, &new_comment("show-1", "hello again")).await.is_ok());
}

// ---------------------------------------------------------------------------
// Rate budget
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_comment_budget_is_independent_of_votes(pool: PgPool) {
    let mut config = GuardConfig::default();
    config.rate_limits.comment = RateQuota { max_requests: 2, window_secs: 3600 };
    let comments = CommentService::new(pool.clone(), &config);
    let votes = VoteService::new(pool.clone(), &config);

    let chatty = seed_user(&pool, "chatty").await;
    let other = seed_user(&pool, "other").await;
    let actor = context_for(&chatty);

    comments.create(&actor, &new_comment("show-2", "first thought")).await.unwrap();
    comments.create(&actor, &new_comment("show-2", "second thought")).await.unwrap();
    let err = comments
        .create(&actor, &new_comment("show-2", "third thought"))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        GuardError::Core(CoreError::RateLimited { retry_after_secs })
            if (1..=3600).contains(&retry_after_secs)
    );

    // An exhausted comment budget leaves the vote budget untouched.
    let target = comments
        .create(&context_for(&other), &new_comment("show-2", "vote on me"))
        .await
        .unwrap();
    assert!(votes.cast(&actor, target.comment.id, 1).await.is_ok());
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_edit_is_author_only_and_rescored(pool: PgPool) {
    let svc = CommentService::new(pool.clone(), &GuardConfig::default());
    let author = seed_user(&pool, "writer").await;
    let intruder = seed_user(&pool, "intruder").await;
    let actor = context_for(&author);

    let comment = svc.create(&actor, &new_comment("show-9", "original take")).await.unwrap().comment;

    let err = svc
        .edit(&context_for(&intruder), comment.id, "hijacked")
        .await
        .unwrap_err();
    assert_matches!(err, GuardError::Core(CoreError::Forbidden(reason)) if reason == "not_author");

    let edited = svc
        .edit(&actor, comment.id, "updated take, details at https://spam.example")
        .await
        .unwrap();
    assert_eq!(edited.comment.edit_count, 1);
    assert!(
        edited.score.has_flag(flags::SUSPICIOUS_PATTERN),
        "an edit is scored like a fresh comment"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_edit_refuses_deleted_and_locked_comments(pool: PgPool) {
    let svc = CommentService::new(pool.clone(), &GuardConfig::default());
    let author = seed_user(&pool, "editor").await;
    let actor = context_for(&author);

    let locked = svc.create(&actor, &new_comment("show-9", "soon locked")).await.unwrap().comment;
    let gone = svc.create(&actor, &new_comment("show-9", "soon gone")).await.unwrap().comment;
    CommentRepo::set_flags(
        &pool,
        locked.id,
        CommentFlags::default(),
        CommentFlags { locked: true, ..Default::default() },
    )
    .await
    .unwrap();
    CommentRepo::set_flags(
        &pool,
        gone.id,
        CommentFlags::default(),
        CommentFlags { deleted: true, ..Default::default() },
    )
    .await
    .unwrap();

    let err = svc.edit(&actor, locked.id, "sneaky rewrite").await.unwrap_err();
    assert_matches!(err, GuardError::Core(CoreError::Conflict(_)));

    let err = svc.edit(&actor, gone.id, "necro rewrite").await.unwrap_err();
    assert_matches!(err, GuardError::Core(CoreError::Conflict(_)));
}

// ---------------------------------------------------------------------------
// Self-service deletion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_own_requires_ownership(pool: PgPool) {
    let svc = CommentService::new(pool.clone(), &GuardConfig::default());
    let author = seed_user(&pool, "owner").await;
    let intruder = seed_user(&pool, "grabber").await;
    let actor = context_for(&author);

    let comment = svc.create(&actor, &new_comment("show-3", "mine to remove")).await.unwrap().comment;

    let err = svc.delete_own(&context_for(&intruder), comment.id).await.unwrap_err();
    assert_matches!(err, GuardError::Core(CoreError::Forbidden(reason)) if reason == "not_author");

    let deleted = svc.delete_own(&actor, comment.id).await.unwrap();
    assert!(deleted.deleted);

    let err = svc.delete_own(&actor, comment.id).await.unwrap_err();
    assert_matches!(err, GuardError::Core(CoreError::Conflict(_)));

    let entries = ModerationLogRepo::list_for_target(&pool, "comment", comment.id, 10)
        .await
        .unwrap();
    let entry = entries.first().expect("self-deletion should be audited");
    assert_eq!(entry.action, "delete");
    assert_eq!(entry.actor_id, author.id);
    assert_eq!(entry.details.as_ref().unwrap()["own"], json!(true));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_muted_user_keeps_non_posting_rights(pool: PgPool) {
    let config = GuardConfig::default();
    let comments = CommentService::new(pool.clone(), &config);
    let votes = VoteService::new(pool.clone(), &config);
    let author = seed_user(&pool, "loud").await;
    let bystander = seed_user(&pool, "bystander").await;

    let own = comments
        .create(&context_for(&author), &new_comment("show-4", "posted before the mute"))
        .await
        .unwrap()
        .comment;
    let theirs = comments
        .create(&context_for(&bystander), &new_comment("show-4", "still votable"))
        .await
        .unwrap()
        .comment;

    let mut actor = context_for(&author);
    actor.muted_until = Some(Utc::now() + Duration::hours(6));

    let err = comments.edit(&actor, own.id, "rewrite under mute").await.unwrap_err();
    assert_matches!(err, GuardError::Core(CoreError::Forbidden(reason)) if reason == "muted");

    // Votes and own-comment removal survive a mute; only posting is gone.
    assert!(votes.cast(&actor, theirs.id, 1).await.is_ok());
    assert!(comments.delete_own(&actor, own.id).await.is_ok());
}
