//! PostgreSQL backing store for the asset request reconciler.
//!
//! - [`repositories`]: zero-sized repos with async CRUD taking `&PgPool`.
//! - [`models`]: `FromRow` row structs and their conversion into the typed
//!   entities of `assetflow_core`.
//! - [`PgStore`]: the [`BackingStore`](assetflow_core::store::BackingStore)
//!   implementation used in production.
//! - [`PgIdentityResolver`]: maps the signed-in auth user to an employee.
//! - [`listener`]: LISTEN/NOTIFY realtime change feed.

use sqlx::postgres::PgPoolOptions;

pub mod identity;
pub mod listener;
pub mod models;
pub mod repositories;
pub mod store;

pub use identity::PgIdentityResolver;
pub use store::PgStore;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
