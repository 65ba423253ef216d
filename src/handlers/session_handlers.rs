//! Session gate middleware and the session-aware pages.
//!
//! The gate resolves the presented token once per request and stores the
//! session in request extensions. Handlers read it through [`CurrentSession`];
//! nothing holds a session globally.

use crate::{
    AppState,
    errors::AppError,
    models::session::{Session, SessionState},
    services::{
        catalog_service::CatalogView,
        session_service::{PROTECTED_PAGE, extract_token, requires_session},
    },
};
use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::convert::Infallible;
use tracing::debug;

pub const UPLOAD_SIGN_IN_PROMPT: &str = "Please sign in to upload videos";
pub const PROFILE_SIGN_IN_PROMPT: &str = "Please sign in to view your profile";
pub const DELETE_SIGN_IN_PROMPT: &str = "Please sign in to delete videos";

/// The request's session, if the gate resolved one.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<Session>);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(parts.extensions.get::<Session>().cloned()))
    }
}

/// Resolve the session and turn away anonymous requests to protected routes.
pub async fn session_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match extract_token(request.headers()) {
        Some(token) => state.sessions.resolve(&token).await,
        None => None,
    };

    let path = request.uri().path();
    if session.is_none() && requires_session(path) {
        debug!(path = %path, "session required");
        return AppError::sign_in(UPLOAD_SIGN_IN_PROMPT).into_response();
    }

    if let Some(session) = session {
        request.extensions_mut().insert(session);
    }
    next.run(request).await
}

/// `GET /api/profile`: the signed-in user, their avatar initial and the
/// catalog, or a sign-in prompt.
pub async fn profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Json<Value> {
    let Some(user) = session else {
        return Json(json!({
            "success": true,
            "session": SessionState::from_session(None, PROFILE_SIGN_IN_PROMPT),
        }));
    };

    let initial = user.initial();
    let catalog = CatalogView::from_result(state.storage.list().await);
    Json(json!({
        "success": true,
        "initial": initial,
        "session": SessionState::from_session(Some(user), PROFILE_SIGN_IN_PROMPT),
        "catalog": catalog,
    }))
}

/// `GET /api/site`
pub async fn site(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "site": &*state.site,
    }))
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadGuidelines {
    pub max_size_gb: u64,
    pub supported_formats: Vec<&'static str>,
    pub max_duration_hours: u64,
    pub accepted_types: Vec<String>,
}

/// `GET /uploads`: upload guidelines. Only reachable with a session.
pub async fn uploads_page(State(state): State<AppState>) -> Json<Value> {
    let rules = &state.site.video_config;
    let guidelines = UploadGuidelines {
        max_size_gb: rules.max_size / (1024 * 1024 * 1024),
        supported_formats: vec!["MP4", "WebM", "MOV"],
        max_duration_hours: rules.max_duration / 3600,
        accepted_types: rules.allowed_types.clone(),
    };
    Json(json!({
        "success": true,
        "page": PROTECTED_PAGE,
        "title": "Upload Surgical Video",
        "guidelines": guidelines,
    }))
}
