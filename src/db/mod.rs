//! Database pool and per-domain queries.

pub mod clients;
pub mod messaging;
pub mod quotes;
pub mod reports;

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Create the Postgres connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
}
