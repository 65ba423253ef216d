use crate::services::{storage_service::StorageError, upload_service::UploadError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
///
/// Rendered as `{"success": false, "error": ..., "status": ...}` so every
/// failed action gives the caller something to show.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// 401 carrying a sign-in prompt.
    pub fn sign_in(prompt: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, prompt)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        let status = match err {
            UploadError::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::NoFileSelected => StatusCode::BAD_REQUEST,
            UploadError::Busy => StatusCode::CONFLICT,
        };
        AppError::new(status, err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidObjectKey(_) | StorageError::InvalidFileName(_) => {
                AppError::bad_request(err.to_string())
            }
            StorageError::NotFound(_) => AppError::not_found(err.to_string()),
            StorageError::Body(ref source) => {
                // A size-limit breach travels through the body stream as an io::Error.
                match source
                    .get_ref()
                    .and_then(|inner| inner.downcast_ref::<UploadError>())
                {
                    Some(upload_err) => AppError::from(upload_err.clone()),
                    None => AppError::bad_request(err.to_string()),
                }
            }
            StorageError::Backend { .. } | StorageError::Transfer { .. } => {
                AppError::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
            StorageError::Config(_) => AppError::internal(err.to_string()),
        }
    }
}
