//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! ci-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `IDENTITY_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migration files live in `crates/server/migrations/` and create the
//! `identity` schema with its `customer` and `admin_user` tables.

use customer_identity_server::config::{ConfigError, database_url_from_env};
use customer_identity_server::db;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the identity database migrations.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to identity database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running identity migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Identity migrations complete!");
    Ok(())
}
