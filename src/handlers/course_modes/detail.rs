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

fn mode_not_found(course_id: &str, mode_slug: &str) -> ApiError {
    ApiError::not_found(format!(
        "Course mode '{}' not found for course '{}'",
        mode_slug, course_id
    ))
}

/// GET /course_modes/:course_id/:mode_slug - Retrieve a single mode
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((course_id, mode_slug)): Path<(String, String)>,
) -> Result<Json<CourseMode>, ApiError> {
    authorize(&user, Action::Retrieve)?;

    match state.course_modes.get(&course_id, &mode_slug).await? {
        Some(mode) => Ok(Json(mode)),
        None => Err(mode_not_found(&course_id, &mode_slug)),
    }
}

/// PATCH /course_modes/:course_id/:mode_slug - Merge-patch a single mode
///
/// The record is fetched first, so a patch against an absent key is 404
/// before the payload is inspected.
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((course_id, mode_slug)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Result<StatusCode, ApiError> {
    authorize(&user, Action::Update)?;

    let mut mode = state
        .course_modes
        .get(&course_id, &mode_slug)
        .await?
        .ok_or_else(|| mode_not_found(&course_id, &mode_slug))?;

    let patch = payload
        .as_object()
        .ok_or_else(|| ApiError::invalid_json("Merge-patch body must be a JSON object"))?;

    mode.apply_merge_patch(patch)?;
    state.course_modes.update(&mode).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /course_modes/:course_id/:mode_slug - Remove a single mode
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((course_id, mode_slug)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    authorize(&user, Action::Delete)?;

    state.course_modes.delete(&course_id, &mode_slug).await?;

    tracing::info!(
        "deleted course mode '{}' for course '{}'",
        mode_slug,
        course_id
    );
    Ok(StatusCode::NO_CONTENT)
}
