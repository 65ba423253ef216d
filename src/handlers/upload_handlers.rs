//! HTTP handlers for uploads.
//!
//! The multipart `file` field is streamed straight into the bucket. Bytes are
//! counted as they pass through the [`UploadFlow`], which also enforces the
//! size ceiling. Clients that send an `x-upload-id` header can poll progress
//! while the request is in flight; the entry goes away with the request.

use crate::{
    AppState,
    errors::AppError,
    format::format_bytes,
    services::upload_service::{UploadDraft, UploadError, UploadFlow},
};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderMap, header},
};
use futures::StreamExt;
use serde_json::{Value, json};
use std::io;
use uuid::Uuid;

pub const UPLOAD_ID_HEADER: &str = "x-upload-id";
pub const FILE_SIZE_HEADER: &str = "x-file-size";

const FILE_FIELD: &str = "file";

/// `POST /api/upload`: upload one video from the `file` multipart field.
pub async fn upload_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let upload_id = upload_id(&headers)?;
    let declared_size = header_u64(&headers, FILE_SIZE_HEADER);
    let request_length = header_u64(&headers, header::CONTENT_LENGTH.as_str());

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(e.status(), e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::bad_request("file field has no file name"))?;
        let content_type = field.content_type().unwrap_or_default().to_string();

        let mut flow = UploadFlow::new(state.site.video_config.clone());
        flow.select_file(UploadDraft {
            file_name: file_name.clone(),
            content_type: content_type.clone(),
            declared_size,
            request_length,
        })?;
        flow.begin()?;

        // Held until this future completes or is dropped.
        let _tracked = upload_id
            .map(|id| state.uploads.register(id, flow.subscribe()))
            .transpose()?;

        let body = field.map(|chunk| {
            let chunk = chunk.map_err(io::Error::other)?;
            flow.record_bytes(chunk.len() as u64)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            Ok::<_, io::Error>(chunk)
        });
        let result = state
            .storage
            .upload_stream(&file_name, &content_type, body)
            .await;
        let progress = flow.complete(&result);

        let uploaded = result?;
        return Ok(Json(json!({
            "success": true,
            "key": uploaded.key,
            "url": uploaded.url,
            "size": uploaded.size,
            "formattedSize": format_bytes(uploaded.size, 2),
            "progress": progress,
        })));
    }

    Err(UploadError::NoFileSelected.into())
}

/// `GET /api/upload/progress/{id}`: progress of an in-flight upload.
pub async fn upload_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let progress = state
        .uploads
        .snapshot(&id)
        .ok_or_else(|| AppError::not_found(format!("no upload in progress with id {}", id)))?;
    Ok(Json(json!({
        "success": true,
        "id": id,
        "progress": progress,
    })))
}

fn upload_id(headers: &HeaderMap) -> Result<Option<Uuid>, AppError> {
    match headers.get(UPLOAD_ID_HEADER) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .map(Some)
            .ok_or_else(|| AppError::bad_request("x-upload-id must be a UUID")),
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}
