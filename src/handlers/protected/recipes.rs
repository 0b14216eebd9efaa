// handlers/protected/recipes.rs - /api/recipes and /api/recipes/:id
//
// Every lookup goes through `scope(Recipe, caller)`, so another account's
// recipe id behaves exactly like an id that does not exist.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::api::recipe::{self, RecipeDetailDto, RecipeDto};
use crate::api::ValidationErrors;
use crate::database::models::{AttributeKind, Recipe, RecipeChanges};
use crate::error::ApiError;
use crate::filter::{scope, EntityKind};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /api/recipes - caller's recipes by title descending
pub async fn list(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Vec<RecipeDto>> {
    let rows = state.store.select_recipes(scope(EntityKind::Recipe, user.id).into_filter()).await?;
    Ok(ApiResponse::success(rows.iter().map(recipe::encode).collect()))
}

/// POST /api/recipes
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<RecipeDto> {
    let Json(body) = payload?;
    let draft = recipe::decode(&body)?;

    let mut errors = ValidationErrors::new();
    resolve_attributes(&state, &user, AttributeKind::Tag, &draft.tags, &mut errors).await?;
    resolve_attributes(&state, &user, AttributeKind::Ingredient, &draft.ingredients, &mut errors).await?;
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let row = state.store.insert_recipe(user.id, draft).await?;
    tracing::debug!("Created recipe {} for account {}", row.id, user.id);
    Ok(ApiResponse::created(recipe::encode(&row)))
}

/// GET /api/recipes/:id - detail view with tags and ingredients expanded
pub async fn retrieve(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<RecipeDetailDto> {
    let row = find_owned(&state, &user, &id).await?;

    let tag_filter = scope(EntityKind::Tag, user.id).with_ids(&row.tags).into_filter();
    let ingredient_filter = scope(EntityKind::Ingredient, user.id).with_ids(&row.ingredients).into_filter();
    let (tags, ingredients) = futures::try_join!(
        state.store.select_attributes(AttributeKind::Tag, tag_filter),
        state.store.select_attributes(AttributeKind::Ingredient, ingredient_filter),
    )?;

    Ok(ApiResponse::success(recipe::encode_detail(&row, &tags, &ingredients)))
}

/// PUT /api/recipes/:id - omitted link, tags and ingredients are cleared
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<RecipeDto> {
    let row = find_owned(&state, &user, &id).await?;
    let Json(body) = payload?;
    let draft = recipe::decode(&body)?;
    apply_changes(&state, &user, row.id, RecipeChanges::from(draft)).await
}

/// PATCH /api/recipes/:id
pub async fn partial_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<RecipeDto> {
    let row = find_owned(&state, &user, &id).await?;
    let Json(body) = payload?;
    let changes = recipe::decode_partial(&body)?;
    apply_changes(&state, &user, row.id, changes).await
}

/// DELETE /api/recipes/:id
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let row = find_owned(&state, &user, &id).await?;
    if !state.store.delete_recipe(row.id).await? {
        return Err(not_found());
    }

    tracing::debug!("Deleted recipe {} for account {}", row.id, user.id);
    Ok(ApiResponse::no_content())
}

async fn apply_changes(state: &AppState, user: &AuthUser, id: Uuid, changes: RecipeChanges) -> ApiResult<RecipeDto> {
    let mut errors = ValidationErrors::new();
    for kind in [AttributeKind::Tag, AttributeKind::Ingredient] {
        if let Some(ids) = changes.attribute_ids(kind) {
            resolve_attributes(state, user, kind, ids, &mut errors).await?;
        }
    }
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let row = state.store.update_recipe(id, changes).await?;
    Ok(ApiResponse::success(recipe::encode(&row)))
}

fn not_found() -> ApiError {
    ApiError::not_found("Not found.")
}

/// Load one of the caller's recipes; malformed and foreign ids are both 404
async fn find_owned(state: &AppState, user: &AuthUser, id: &str) -> Result<Recipe, ApiError> {
    let id = Uuid::parse_str(id).map_err(|_| not_found())?;
    let mut rows = state
        .store
        .select_recipes(scope(EntityKind::Recipe, user.id).with_id(id).into_filter())
        .await?;
    rows.pop().ok_or_else(not_found)
}

/// Every id must name an attribute the caller owns; anything else is
/// reported as nonexistent under the payload field.
async fn resolve_attributes(
    state: &AppState,
    user: &AuthUser,
    kind: AttributeKind,
    ids: &[Uuid],
    errors: &mut ValidationErrors,
) -> Result<(), ApiError> {
    if ids.is_empty() {
        return Ok(());
    }

    let owned = state
        .store
        .select_attributes(kind, scope(kind.entity(), user.id).with_ids(ids).into_filter())
        .await?;

    if let Some(missing) = ids.iter().find(|id| !owned.iter().any(|row| row.id == **id)) {
        errors.add(kind.recipe_field(), format!("Invalid pk \"{}\" - object does not exist.", missing));
    }
    Ok(())
}
