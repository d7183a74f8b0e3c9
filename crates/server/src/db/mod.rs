//! Local account store.
//!
//! # Database: `identity`
//!
//! ## Tables
//!
//! - `identity.customer` - Customer accounts
//! - `identity.admin_user` - Admin user accounts
//!
//! Both tables share a shape (`id`, `name`, `cpf`, `email`) and a unique
//! constraint on `cpf`, which is what serializes concurrent creations of the
//! same tax id.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/`, embedded in
//! [`MIGRATOR`], and run via:
//! ```bash
//! cargo run -p customer-identity-cli -- migrate
//! ```

pub mod accounts;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use customer_identity_core::{Account, AccountId, Cpf};

use crate::context::{CallContext, DeadlineExceeded};

pub use accounts::PgAccountStore;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique cpf).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The caller's deadline expired before the query finished.
    #[error("query timed out")]
    Timeout,
}

impl From<DeadlineExceeded> for RepositoryError {
    fn from(_: DeadlineExceeded) -> Self {
        Self::Timeout
    }
}

/// Persistence capability for one kind of account.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account and return the assigned ID.
    ///
    /// The account's own `id` is ignored.
    async fn insert(&self, ctx: &CallContext, account: &Account)
    -> Result<AccountId, RepositoryError>;

    /// Overwrite name, cpf and email of the account with `account.id`.
    ///
    /// Never creates: a missing row is `RepositoryError::NotFound`.
    async fn save(&self, ctx: &CallContext, account: &Account) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, ctx: &CallContext, id: AccountId)
    -> Result<Account, RepositoryError>;

    async fn find_by_tax_id(&self, ctx: &CallContext, cpf: &Cpf)
    -> Result<Account, RepositoryError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the recorded history
/// diverges from the embedded one.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
