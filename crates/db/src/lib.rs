//! Catalog persistence over PostgreSQL.
//!
//! Thin data layer: `FromRow` models, repository structs with runtime
//! query strings, and [`catalog::SqlCatalog`] bridging the database to the
//! engine's catalog-provider trait.

use sqlx::postgres::PgPoolOptions;

pub mod catalog;
pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify connectivity with a trivial round-trip.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
