//! Account lookup and update route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use customer_identity_core::{Account, AccountId, AccountInput, TaxIdForm};

use crate::context::CallContext;
use crate::error::Result;
use crate::services::AccountService;
use crate::state::AppState;

/// The path ID wins over any ID in the body.
async fn update(
    service: &AccountService,
    ctx: &CallContext,
    id: i64,
    mut input: AccountInput,
) -> Result<StatusCode> {
    input.id = AccountId::new(id);
    service.update(ctx, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: CallContext,
    Json(input): Json<AccountInput>,
) -> Result<StatusCode> {
    update(state.customers(), &ctx, id, input).await
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: CallContext,
) -> Result<Json<Account>> {
    Ok(Json(state.customers().get_by_id(&ctx, AccountId::new(id)).await?))
}

/// Look up a customer by CPF, with or without punctuation.
pub async fn get_customer_by_cpf(
    State(state): State<AppState>,
    Path(cpf): Path<String>,
    ctx: CallContext,
) -> Result<Json<Account>> {
    Ok(Json(state.customers().get_by_tax_id(&ctx, &cpf).await?))
}

pub async fn update_admin_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: CallContext,
    Json(input): Json<AccountInput>,
) -> Result<StatusCode> {
    update(state.admin_users(), &ctx, id, input).await
}

pub async fn get_admin_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: CallContext,
) -> Result<Json<Account>> {
    Ok(Json(state.admin_users().get_by_id(&ctx, AccountId::new(id)).await?))
}

/// Look up an admin user by the CPF in the request body.
pub async fn get_admin_user_by_cpf(
    State(state): State<AppState>,
    ctx: CallContext,
    Json(form): Json<TaxIdForm>,
) -> Result<Json<Account>> {
    Ok(Json(state.admin_users().get_by_tax_id(&ctx, &form.cpf).await?))
}
