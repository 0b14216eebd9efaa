// handlers/protected/users.rs - GET|PUT|PATCH /api/users/me

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde_json::Value;

use crate::api::account::{decode_update, AccountDto, UpdateMode};
use crate::auth::hash_password;
use crate::database::models::AccountChanges;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /api/users/me - the caller's own profile
pub async fn me_get(Extension(user): Extension<AuthUser>) -> ApiResult<AccountDto> {
    Ok(ApiResponse::success(AccountDto { name: user.name, email: user.email }))
}

/// PUT /api/users/me - replace name and password
pub async fn me_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<AccountDto> {
    let Json(body) = payload?;
    update_me(&state, &user, &body, UpdateMode::Full).await
}

/// PATCH /api/users/me - change name and/or password
pub async fn me_patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<AccountDto> {
    let Json(body) = payload?;
    update_me(&state, &user, &body, UpdateMode::Partial).await
}

async fn update_me(state: &AppState, user: &AuthUser, body: &Value, mode: UpdateMode) -> ApiResult<AccountDto> {
    let security = &state.config.security;
    let update = decode_update(body, mode, security.min_password_length)?;

    let password_hash = match update.password {
        Some(password) => Some(hash_password(&password, security.password_hash_cost).await?),
        None => None,
    };

    let account = state
        .store
        .update_account(user.id, AccountChanges { name: update.name, password_hash })
        .await?;

    Ok(ApiResponse::success(AccountDto::from(&account)))
}
