// handlers/public/users.rs - POST /api/users/create, POST /api/users/token

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use crate::api::account::{decode_credentials, decode_signup, AccountDto};
use crate::api::{ValidationErrors, NON_FIELD_ERRORS};
use crate::auth::{generate_jwt, hash_password, verify_password, Claims};
use crate::database::models::NewAccount;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TokenDto {
    pub token: String,
}

/**
 * POST /api/users/create - Register a new account
 *
 * Input: `{"email": "...", "password": "...", "name"?: "..."}`
 * Output: 201 with `{"name", "email"}`. The password is write-only.
 * Taken emails and short passwords fail with 400 and field errors.
 */
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<AccountDto> {
    let Json(body) = payload?;
    let signup = decode_signup(&body, state.config.security.min_password_length)?;

    if state.store.find_account_by_email(&signup.email).await?.is_some() {
        return Err(ValidationErrors::single("email", "user with this email already exists.").into());
    }

    let password_hash = hash_password(&signup.password, state.config.security.password_hash_cost).await?;
    let account = state
        .store
        .insert_account(NewAccount {
            email: signup.email,
            name: signup.name,
            password_hash,
        })
        .await?;

    tracing::debug!("Created account {}", account.id);
    Ok(ApiResponse::created(AccountDto::from(&account)))
}

/**
 * POST /api/users/token - Exchange email and password for an access token
 *
 * Input: `{"email": "...", "password": "..."}`
 * Output: `{"token": "..."}`. Any mismatch returns the same generic
 * message so callers cannot tell which field was wrong.
 */
pub async fn create_token(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<TokenDto> {
    let Json(body) = payload?;
    let credentials = decode_credentials(&body)?;

    let account = match state.store.find_account_by_email(&credentials.email).await? {
        Some(account) if account.is_active => account,
        _ => {
            tracing::warn!("Token request for unknown or inactive account");
            return Err(authentication_failed());
        }
    };

    if !verify_password(&credentials.password, &account.password_hash).await? {
        tracing::warn!("Token request with wrong password for account {}", account.id);
        return Err(authentication_failed());
    }

    let security = &state.config.security;
    let claims = Claims::new(account.id, account.email.as_str(), security.jwt_expiry_hours)?;
    let token = generate_jwt(&claims, &security.jwt_secret)?;

    Ok(ApiResponse::success(TokenDto { token }))
}

fn authentication_failed() -> ApiError {
    ValidationErrors::single(NON_FIELD_ERRORS, "Unable to authenticate with provided credentials").into()
}
