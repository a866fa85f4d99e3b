//! Account handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use elevaite_entity::account::{Account, CreateAccount, UpdateAccount};
use elevaite_service::{AccountUser, AccountUserFilter, MessageResponse};

use crate::dto::request::{
    AccountListQuery, AdminActionRequest, CreateAccountRequest, PatchAccountRequest,
    UserIdsRequest,
};
use crate::error::ApiResult;
use crate::extractors::{JsonBody, ValidJson};
use crate::state::AppState;
use crate::validators::Validated;
use crate::validators::rules;

/// POST /accounts
pub async fn create_account(
    State(state): State<AppState>,
    v: Validated<rules::CreateAccount>,
    ValidJson(req): ValidJson<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    let account = state
        .services
        .accounts
        .create_account(
            &v.context(),
            CreateAccount {
                name: req.name,
                description: req.description,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET /accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    v: Validated<rules::ListAccounts>,
    Query(query): Query<AccountListQuery>,
) -> ApiResult<Json<Vec<Account>>> {
    let accounts = state
        .services
        .accounts
        .list_accounts(&v.context(), query.name.as_deref())
        .await?;
    Ok(Json(accounts))
}

/// GET /accounts/{account_id}
pub async fn get_account(v: Validated<rules::ReadAccount>) -> ApiResult<Json<Account>> {
    Ok(Json(v.account()?.clone()))
}

/// PATCH /accounts/{account_id}
pub async fn patch_account(
    State(state): State<AppState>,
    v: Validated<rules::PatchAccount>,
    ValidJson(req): ValidJson<PatchAccountRequest>,
) -> ApiResult<Json<Account>> {
    let account = state
        .services
        .accounts
        .update_account(
            v.account()?.id,
            UpdateAccount {
                name: req.name,
                description: req.description,
            },
        )
        .await?;
    Ok(Json(account))
}

/// GET /accounts/{account_id}/users
pub async fn list_account_users(
    State(state): State<AppState>,
    v: Validated<rules::ReadAccount>,
    Query(filter): Query<AccountUserFilter>,
) -> ApiResult<Json<Vec<AccountUser>>> {
    let users = state
        .services
        .accounts
        .list_account_users(v.account()?.id, &filter)
        .await?;
    Ok(Json(users))
}

/// POST /accounts/{account_id}/users
pub async fn assign_account_users(
    State(state): State<AppState>,
    v: Validated<rules::ManageAccountUsers>,
    ValidJson(req): ValidJson<UserIdsRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let message = state
        .services
        .accounts
        .assign_users(v.account()?.id, &req.user_ids)
        .await?;
    Ok(Json(message))
}

/// DELETE /accounts/{account_id}/users/{user_id}
pub async fn deassign_account_user(
    State(state): State<AppState>,
    v: Validated<rules::ManageAccountUsers>,
) -> ApiResult<Json<MessageResponse>> {
    let message = state
        .services
        .accounts
        .deassign_user(&v.context(), v.account()?.id, v.id("user_id")?)
        .await?;
    Ok(Json(message))
}

/// PATCH /accounts/{account_id}/users/{user_id}/admin
pub async fn update_account_admin(
    State(state): State<AppState>,
    v: Validated<rules::UpdateAccountAdmin>,
    JsonBody(req): JsonBody<AdminActionRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let message = state
        .services
        .accounts
        .set_account_admin(&v.context(), v.account()?.id, v.id("user_id")?, req.action)
        .await?;
    Ok(Json(message))
}
