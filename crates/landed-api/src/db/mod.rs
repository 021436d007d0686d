//! # Database Persistence Layer
//!
//! Optional Postgres persistence via SQLx.
//!
//! When `DATABASE_URL` is set, rate bands, categories and the shipping
//! configuration are written through to PostgreSQL on every mutation and
//! loaded back into the in-memory stores on startup. When absent, the API
//! runs in in-memory-only mode (development and tests).

pub mod categories;
pub mod rate_bands;
pub mod shipping_config;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            tracing::warn!(
                "DATABASE_URL not set, running in-memory only. \
                 Rates and categories will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
