// handlers/protected/attributes.rs - GET|POST /api/tags, GET|POST /api/ingredients
//
// Tags and ingredients share one shape, so each route is a thin wrapper
// naming its `AttributeKind`.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::api::attribute::{self, AttributeDto};
use crate::api::ValidationErrors;
use crate::database::models::AttributeKind;
use crate::error::ApiError;
use crate::filter::scope;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub assigned_only: Option<String>,
}

impl ListQuery {
    /// Any non-zero integer turns the filter on
    fn assigned_only(&self) -> Result<bool, ApiError> {
        match self.assigned_only.as_deref() {
            None => Ok(false),
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map(|n| n != 0)
                .map_err(|_| ValidationErrors::single("assigned_only", "A valid integer is required.").into()),
        }
    }
}

pub async fn list_tags(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<AttributeDto>> {
    list(&state, &user, AttributeKind::Tag, &query).await
}

pub async fn create_tag(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<AttributeDto> {
    let Json(body) = payload?;
    create(&state, &user, AttributeKind::Tag, &body).await
}

pub async fn list_ingredients(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<AttributeDto>> {
    list(&state, &user, AttributeKind::Ingredient, &query).await
}

pub async fn create_ingredient(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<AttributeDto> {
    let Json(body) = payload?;
    create(&state, &user, AttributeKind::Ingredient, &body).await
}

/// Caller's rows by name descending. With `assigned_only`, only rows linked
/// to at least one of the caller's recipes, each listed once.
async fn list(state: &AppState, user: &AuthUser, kind: AttributeKind, query: &ListQuery) -> ApiResult<Vec<AttributeDto>> {
    let mut filter = scope(kind.entity(), user.id);
    if query.assigned_only()? {
        let in_use = state.store.attribute_ids_in_use(kind, user.id).await?;
        filter = filter.with_ids(&in_use);
    }

    let rows = state.store.select_attributes(kind, filter.into_filter()).await?;
    Ok(ApiResponse::success(attribute::encode(&rows)))
}

async fn create(state: &AppState, user: &AuthUser, kind: AttributeKind, body: &Value) -> ApiResult<AttributeDto> {
    let name = attribute::decode(body)?;
    let row = state.store.insert_attribute(kind, user.id, name).await?;

    tracing::debug!("Created {} {} for account {}", kind.entity().label(), row.id, user.id);
    Ok(ApiResponse::created(AttributeDto::from(&row)))
}
