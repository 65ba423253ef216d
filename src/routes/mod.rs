//! Defines routes for the video catalog service.
//!
//! ## Structure
//! - **Probes**
//!   - `GET    /healthz`, `GET /readyz`
//!
//! - **Catalog endpoints**
//!   - `GET    /api/videos`: list videos as a catalog view
//!   - `GET    /api/videos/{*key}`: playable URL for one video
//!   - `DELETE /api/videos/{*key}`: delete a video (session required)
//!
//! - **Upload endpoints** (everything under `/api/upload` needs a session)
//!   - `POST   /api/upload`: multipart upload
//!   - `GET    /api/upload/progress/{id}`: in-flight progress
//!
//! - **Pages**
//!   - `GET    /api/site`, `GET /api/profile`, `GET /uploads` (session required)
//!
//! The wildcard `*key` carries the full object key, e.g. `videos/1700000000000-knee.mp4`.

use crate::{
    AppState,
    handlers::{
        health_handlers::{healthz, readyz},
        session_handlers::{profile, session_gate, site, uploads_page},
        upload_handlers::{upload_progress, upload_video},
        video_handlers::{delete_video, get_video_url, list_videos},
    },
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};

/// Multipart framing allowance on top of the video size ceiling.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Build the router for all routes.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes(max_upload_size: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_upload_size.saturating_add(MULTIPART_OVERHEAD))
        .unwrap_or(usize::MAX);

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // catalog
        .route("/api/videos", get(list_videos))
        .route("/api/videos/{*key}", get(get_video_url).delete(delete_video))
        // uploads
        .route(
            "/api/upload",
            post(upload_video).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/upload/progress/{id}", get(upload_progress))
        // pages
        .route("/api/site", get(site))
        .route("/api/profile", get(profile))
        .route("/uploads", get(uploads_page))
}

/// The complete application: routes, the session gate, and state.
pub fn app(state: AppState) -> Router {
    let max_upload_size = state.site.video_config.max_size;
    routes(max_upload_size)
        .layer(middleware::from_fn_with_state(state.clone(), session_gate))
        .with_state(state)
}
