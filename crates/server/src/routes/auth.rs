//! Sign-up and login route handlers.

use axum::{Json, extract::State};

use customer_identity_core::{AccountCreated, AccountInput, CredentialToken, TaxIdForm};

use crate::context::CallContext;
use crate::error::Result;
use crate::state::AppState;

/// Register a customer with the identity provider and store it.
pub async fn signup(
    State(state): State<AppState>,
    ctx: CallContext,
    Json(input): Json<AccountInput>,
) -> Result<Json<AccountCreated>> {
    Ok(Json(state.customers().create(&ctx, input).await?))
}

/// Log a customer in by CPF.
pub async fn login(
    State(state): State<AppState>,
    ctx: CallContext,
    Json(form): Json<TaxIdForm>,
) -> Result<Json<CredentialToken>> {
    Ok(Json(state.customers().login(&ctx, &form.cpf).await?))
}

/// Log in as the shared guest identity, for customers who don't want an
/// account.
pub async fn login_unknown(
    State(state): State<AppState>,
    ctx: CallContext,
) -> Result<Json<CredentialToken>> {
    Ok(Json(state.customers().login_anonymous(&ctx).await?))
}

/// Register an admin user with the identity provider and store it.
pub async fn admin_signup(
    State(state): State<AppState>,
    ctx: CallContext,
    Json(input): Json<AccountInput>,
) -> Result<Json<AccountCreated>> {
    Ok(Json(state.admin_users().create(&ctx, input).await?))
}

/// Log an admin user in by CPF.
pub async fn admin_login(
    State(state): State<AppState>,
    ctx: CallContext,
    Json(form): Json<TaxIdForm>,
) -> Result<Json<CredentialToken>> {
    Ok(Json(state.admin_users().login(&ctx, &form.cpf).await?))
}
