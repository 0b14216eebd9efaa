use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::validate_jwt;
use crate::database::models::Account;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, inserted into request extensions by `require_auth`
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<&Account> for AuthUser {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
        }
    }
}

/// Token gate for every protected route. Resolves the token to a live,
/// active account before the handler runs; nothing downstream executes otherwise.
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token_from_headers(&headers).map_err(|msg| {
        tracing::warn!("Rejected request to {}: {}", request.uri().path(), msg);
        ApiError::unauthorized("Authentication credentials were not provided.")
    })?;

    let claims = validate_jwt(token, &state.config.security.jwt_secret).map_err(|e| {
        tracing::warn!("Rejected token: {}", e);
        ApiError::unauthorized("Invalid token.")
    })?;

    let account = match state.store.find_account(claims.sub).await? {
        Some(account) if account.is_active => account,
        Some(_) => {
            tracing::warn!("Rejected token for inactive account {}", claims.sub);
            return Err(ApiError::unauthorized("User inactive or deleted."));
        }
        None => {
            tracing::warn!("Rejected token for unknown account {}", claims.sub);
            return Err(ApiError::unauthorized("Invalid token."));
        }
    };

    request.extensions_mut().insert(AuthUser::from(&account));

    Ok(next.run(request).await)
}

/// Accepts `Bearer <token>` and `Token <token>`
fn extract_token_from_headers(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .or_else(|| auth_str.strip_prefix("Token "))
        .ok_or("Authorization header must use Bearer or Token format")?
        .trim();

    if token.is_empty() {
        return Err("Empty token");
    }
    Ok(token)
}
