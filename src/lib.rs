//! Surgical training video catalog.
//!
//! An axum service fronting a bucket of videos (upload, list, delete,
//! playable URLs) behind an externally managed session, plus the
//! host-driven state machines used by the browser player and the VR viewer.

use std::sync::Arc;

pub mod config;
pub mod errors;
pub mod format;
pub mod handlers;
pub mod models;
pub mod playback;
pub mod routes;
pub mod services;
pub mod vr;

use config::SiteConfig;
use services::{
    session_service::SessionProvider, storage_service::StorageService,
    upload_service::UploadTracker,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: StorageService,
    pub sessions: Arc<dyn SessionProvider>,
    pub uploads: UploadTracker,
    pub site: Arc<SiteConfig>,
}

impl AppState {
    pub fn new(
        storage: StorageService,
        sessions: Arc<dyn SessionProvider>,
        site: SiteConfig,
    ) -> Self {
        Self {
            storage,
            sessions,
            uploads: UploadTracker::new(),
            site: Arc::new(site),
        }
    }
}
