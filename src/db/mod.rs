//! Database pool and migrations
//!
//! The pool connects lazily: a database that is down at startup does not stop
//! the server, each submission simply fails with the driver's message until
//! it is reachable again.

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

/// Database setup error
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Invalid database configuration: {0}")]
    Configuration(String),

    #[error("Failed to run migrations: {0}")]
    Migration(String),
}

/// Create a lazily connecting pool from the configured connection string
pub fn create_pool(config: &Config) -> Result<PgPool, DbError> {
    tracing::info!(
        database = %config.database_url_masked(),
        max_connections = config.db_max_connections,
        "Configuring database pool"
    );

    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect_lazy(&config.database_url)
        .map_err(|e| DbError::Configuration(e.to_string()))
}

/// Run embedded database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running database migrations...");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DbError::Migration(e.to_string()))?;

    tracing::info!("Database migrations completed successfully");

    Ok(())
}
