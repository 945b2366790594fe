//! Persistence layer: connection pooling, models, and repositories for the
//! authorization and moderation tables.

pub mod models;
pub mod repositories;

pub use sqlx::PgPool;

/// Default maximum number of pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Connect to PostgreSQL and build a pool.
///
/// Migrations are not run here; callers that own the schema run
/// `sqlx::migrate!` themselves (tests do this through `#[sqlx::test]`).
pub async fn connect_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Cheap liveness probe for startup checks and health endpoints.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
