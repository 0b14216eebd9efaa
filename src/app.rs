use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::require_auth;
use crate::state::AppState;

/// Full application router, ready to serve
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(user_routes())
        .merge(attribute_routes())
        .merge(recipe_routes())
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected API
        .merge(protected)
        .fallback(fallback)
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(&state.config.security))
                .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes)),
        );

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::users;

    Router::new()
        .route("/api/users/create", post(users::create_user))
        .route("/api/users/token", post(users::create_token))
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new().route("/api/users/me", get(users::me_get).put(users::me_put).patch(users::me_patch))
}

fn attribute_routes() -> Router<AppState> {
    use protected::attributes;

    Router::new()
        .route("/api/tags", get(attributes::list_tags).post(attributes::create_tag))
        .route(
            "/api/ingredients",
            get(attributes::list_ingredients).post(attributes::create_ingredient),
        )
}

fn recipe_routes() -> Router<AppState> {
    use protected::recipes;

    Router::new()
        .route("/api/recipes", get(recipes::list).post(recipes::create))
        .route(
            "/api/recipes/:id",
            get(recipes::retrieve)
                .put(recipes::update)
                .patch(recipes::partial_update)
                .delete(recipes::destroy),
        )
}

/// `*` in the origin list allows any origin
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Recipe API",
            "version": version,
            "description": "Per-user tags, ingredients and recipes behind token authentication",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "users": "/api/users/create, /api/users/token (public - signup and token acquisition)",
                "me": "/api/users/me (protected)",
                "tags": "/api/tags[?assigned_only=1] (protected)",
                "ingredients": "/api/ingredients[?assigned_only=1] (protected)",
                "recipes": "/api/recipes[/:id] (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}

async fn fallback() -> ApiError {
    ApiError::not_found("Not found.")
}
