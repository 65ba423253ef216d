//! HTTP handlers for the video catalog: list, resolve URL, delete.

use crate::{
    AppState,
    errors::AppError,
    handlers::session_handlers::{CurrentSession, DELETE_SIGN_IN_PROMPT},
    services::catalog_service::CatalogView,
};
use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

/// `GET /api/videos`: the catalog view. A failed listing is an error
/// response, never an empty catalog.
pub async fn list_videos(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let videos = state.storage.list().await?;
    Ok(Json(json!({
        "success": true,
        "catalog": CatalogView::from_videos(videos),
    })))
}

/// `GET /api/videos/{*key}`: a playable URL for one video.
pub async fn get_video_url(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, AppError> {
    let resolved = state.storage.get_url(&key).await?;
    Ok(Json(json!({
        "success": true,
        "key": resolved.key,
        "url": resolved.url,
        "presigned": resolved.presigned,
    })))
}

/// `DELETE /api/videos/{*key}`: remove a video. Requires a session.
pub async fn delete_video(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(key): Path<String>,
) -> Result<Json<Value>, AppError> {
    if session.is_none() {
        return Err(AppError::sign_in(DELETE_SIGN_IN_PROMPT));
    }
    state.storage.delete(&key).await?;
    Ok(Json(json!({
        "success": true,
        "key": key,
    })))
}
