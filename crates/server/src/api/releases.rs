//! Tracked release handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Form, Json};
use toloka_core::{AddReleaseRequest, OperationResult, TitleRecord, UpdateReleaseRequest};

use super::handlers::{api_error, require_engine, ApiError};
use crate::state::AppState;

/// POST /api/v1/releases
///
/// Bind a new title from a listing-source URL. The operation outcome is in
/// the body's `response_code`.
pub async fn add_release(
    State(state): State<Arc<AppState>>,
    Form(request): Form<AddReleaseRequest>,
) -> Result<Json<OperationResult>, ApiError> {
    let engine = require_engine(&state)?;
    Ok(Json(engine.add_release_by_url(request).await))
}

/// POST /api/v1/releases/update
pub async fn update_release(
    State(state): State<Arc<AppState>>,
    Form(request): Form<UpdateReleaseRequest>,
) -> Result<Json<OperationResult>, ApiError> {
    let engine = require_engine(&state)?;
    Ok(Json(engine.update_release_by_name(request).await))
}

/// POST /api/v1/releases/update-all
pub async fn update_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OperationResult>, ApiError> {
    let engine = require_engine(&state)?;
    Ok(Json(engine.update_releases().await))
}

/// GET /api/v1/titles
///
/// Every tracked title keyed by codename. Served from the store, so it works
/// without a configured engine.
pub async fn list_titles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, TitleRecord>>, ApiError> {
    let titles = state
        .titles()
        .list_all()
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(
        titles
            .into_iter()
            .map(|t| (t.codename.clone(), t))
            .collect(),
    ))
}
