//! Health & readiness handlers.
//!
//! - GET /healthz  -> liveness, no I/O
//! - GET /readyz   -> the bucket answers a listing, plus in-flight upload count

use crate::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::BTreeMap;

/// `GET /healthz`
pub async fn healthz() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// `GET /readyz`
///
/// 200 when the store answers a one-level listing of the video prefix,
/// 503 otherwise.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let storage = match state.storage.probe().await {
        Ok(()) => CheckStatus::passed(),
        Err(e) => CheckStatus::failed(e.to_string()),
    };
    let ready = storage.ok;

    let body = ReadyResponse {
        status: if ready { "ok" } else { "error" },
        bucket: state.storage.bucket().to_string(),
        uploads_in_flight: state.uploads.len(),
        checks: BTreeMap::from([("storage", storage)]),
    };

    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadyResponse {
    status: &'static str,
    bucket: String,
    uploads_in_flight: usize,
    checks: BTreeMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CheckStatus {
    fn passed() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            ok: false,
            error: Some(error),
        }
    }
}
