use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use toloka_core::{ListingError, SanitizedConfig, SyncEngine, SyncError};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

/// The engine, or 503 when the listing source or download client is missing.
pub fn require_engine(state: &AppState) -> Result<&SyncEngine, ApiError> {
    state.engine().ok_or_else(|| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Sync engine not configured (listing source and download client required)",
        )
    })
}

/// Map a passthrough failure to an HTTP status.
pub fn sync_error(e: SyncError) -> ApiError {
    let status = match &e {
        SyncError::TitleNotFound(_) | SyncError::Source(ListingError::NotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        SyncError::Source(ListingError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
        SyncError::Source(_) | SyncError::Client(_) => StatusCode::BAD_GATEWAY,
        SyncError::InvalidRequest(_) | SyncError::Match(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SyncError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.to_string())
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /api/v1/metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
