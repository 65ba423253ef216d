//! HTTP handlers. Each delegates to a service and renders JSON with a
//! `success` flag; failures go through `AppError`.

pub mod health_handlers;
pub mod session_handlers;
pub mod upload_handlers;
pub mod video_handlers;
