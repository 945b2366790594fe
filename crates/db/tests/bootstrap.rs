use banter_db::models::user::CreateUser;
use banter_db::repositories::UserRepo;
use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    // Health check
    banter_db::health_check(&pool).await.unwrap();

    // Verify all eight tables exist after migrations
    let tables = [
        "users",
        "identities",
        "sessions",
        "rate_windows",
        "comments",
        "votes",
        "reports",
        "moderation_log",
    ];

    for table in tables {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap_or_else(|e| panic!("{table} existence query failed: {e}"));
        assert!(exists.0, "table {table} should exist after migrations");
    }
}

/// Every table must carry its `trg_<table>_updated_at` trigger.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_updated_at_triggers_present(pool: PgPool) {
    let tables = [
        "users",
        "identities",
        "sessions",
        "rate_windows",
        "comments",
        "votes",
        "reports",
        "moderation_log",
    ];

    for table in tables {
        let trigger = format!("trg_{table}_updated_at");
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.triggers
                WHERE event_object_table = $1 AND trigger_name = $2
            )",
        )
        .bind(table)
        .bind(&trigger)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(exists.0, "table {table} should have trigger {trigger}");
    }
}

/// The shared trigger actually advances `updated_at` on UPDATE.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_updated_at_trigger_fires(pool: PgPool) {
    let user = UserRepo::create(
        &pool,
        &CreateUser {
            display_name: "trigger_probe".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(user.created_at, user.updated_at);

    let updated = UserRepo::set_display_name(&pool, user.id, "trigger_probe_renamed")
        .await
        .unwrap();
    assert!(updated);

    let after = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert!(
        after.updated_at > user.updated_at,
        "updated_at should advance on update: {} !> {}",
        after.updated_at,
        user.updated_at
    );
}
