use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde_json::Value;

use crate::auth::gate::{authorize, Action};
use crate::database::models::CourseMode;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::AppState;

/// GET /course_modes/:course_id - List all modes for a course
///
/// No pagination or filtering; a course carries at most a handful of modes.
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<CourseMode>>, ApiError> {
    authorize(&user, Action::List)?;

    let modes = state.course_modes.list(&course_id).await?;
    Ok(Json(modes))
}

/// POST /course_modes/:course_id - Create a new mode for a course
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<CourseMode>), ApiError> {
    authorize(&user, Action::Create)?;

    let mode = CourseMode::from_create_payload(payload)?;
    if mode.course_id != course_id {
        return Err(ApiError::validation_error(
            "course_id in payload does not match the requested course",
            None,
        ));
    }

    state.course_modes.create(&mode).await?;

    tracing::info!(
        "created course mode '{}' for course '{}'",
        mode.mode_slug,
        mode.course_id
    );
    Ok((StatusCode::CREATED, Json(mode)))
}
