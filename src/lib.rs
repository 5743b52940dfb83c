use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use database::repository::CourseModeStoreHandle;
use handlers::course_modes;

/// Shared application state: the injected course mode storage handle
#[derive(Clone)]
pub struct AppState {
    pub course_modes: CourseModeStoreHandle,
}

impl AppState {
    pub fn new(course_modes: CourseModeStoreHandle) -> Self {
        Self { course_modes }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Staff-only course mode management
        .merge(course_mode_routes())
        .with_state(state)
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

fn course_mode_routes() -> Router<AppState> {
    Router::new()
        // Course-level operations (collection)
        .route(
            "/course_modes/:course_id",
            get(course_modes::collection_get).post(course_modes::collection_post),
        )
        // Mode-level operations (individual)
        .route(
            "/course_modes/:course_id/:mode_slug",
            get(course_modes::detail_get)
                .patch(course_modes::detail_patch)
                .delete(course_modes::detail_delete),
        )
        .layer(axum::middleware::from_fn(middleware::jwt_auth_middleware))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Course Modes API",
            "version": version,
            "description": "Staff-only course mode management API",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "course_modes": "/course_modes/:course_id[/:mode_slug] (staff only)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
