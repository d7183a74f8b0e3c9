//! Account management commands.
//!
//! These drive the same [`AccountService`] as the HTTP server, so a CLI
//! creation registers the identity in Cognito before storing it locally.
//!
//! # Environment Variables
//!
//! Same as the server: `IDENTITY_DATABASE_URL`, `AWS_REGION`,
//! `COGNITO_USER_POOL_ID`, `COGNITO_CLIENT_ID`, the group names and the
//! password suffixes.
//!
//! [`AccountService`]: customer_identity_server::services::AccountService

use customer_identity_core::{Account, AccountId, AccountInput, AccountKind, ClassifiedError};
use customer_identity_server::config::{ConfigError, ServerConfig};
use customer_identity_server::context::CallContext;
use customer_identity_server::db;
use customer_identity_server::services::AccountService;
use customer_identity_server::state::AppState;
use thiserror::Error;

/// Errors that can occur during account commands.
#[derive(Debug, Error)]
pub enum AccountCommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Service(#[from] ClassifiedError),
}

async fn connect() -> Result<(ServerConfig, AppState), AccountCommandError> {
    let config = ServerConfig::from_env()?;

    tracing::info!("Connecting to identity database...");
    let pool = db::create_pool(&config.database_url).await?;
    let state = AppState::from_config(&config, pool).await;
    Ok((config, state))
}

fn service(state: &AppState, kind: AccountKind) -> &AccountService {
    match kind {
        AccountKind::Customer => state.customers(),
        AccountKind::AdminUser => state.admin_users(),
    }
}

/// Register and store a new account.
///
/// # Returns
///
/// The ID assigned by the local store.
pub async fn create(
    kind: AccountKind,
    name: String,
    cpf: String,
    email: String,
) -> Result<AccountId, AccountCommandError> {
    let (config, state) = connect().await?;
    let ctx = CallContext::new().with_timeout(config.call_timeout);

    tracing::info!("Creating {}: {} <{}>", kind, name, email);

    let created = service(&state, kind)
        .create(
            &ctx,
            AccountInput {
                id: AccountId::UNASSIGNED,
                name,
                cpf,
                email,
            },
        )
        .await?;

    tracing::info!("{} created successfully! ID: {}", kind, created.id);
    Ok(created.id)
}

/// Show a stored account by CPF.
pub async fn show(kind: AccountKind, cpf: &str) -> Result<(), AccountCommandError> {
    let (config, state) = connect().await?;
    let ctx = CallContext::new().with_timeout(config.call_timeout);

    let account = service(&state, kind).get_by_tax_id(&ctx, cpf).await?;

    tracing::info!("{}", summary(kind, &account));
    Ok(())
}

/// One-line description of an account, with the CPF masked.
fn summary(kind: AccountKind, account: &Account) -> String {
    format!(
        "{} {}: {} <{}> CPF {}",
        kind,
        account.id,
        account.name,
        account.email,
        account.cpf.masked()
    )
}
