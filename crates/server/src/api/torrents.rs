//! Listing source and download client passthrough handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use toloka_core::{OperationResult, SubmitHandle, TorrentRecord};

use super::handlers::{require_engine, sync_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct TorrentIdParams {
    pub id: String,
}

/// GET /api/v1/torrents/search?query=
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<TorrentRecord>>, ApiError> {
    let engine = require_engine(&state)?;
    engine
        .search_torrents(&params.query)
        .await
        .map(Json)
        .map_err(sync_error)
}

/// GET /api/v1/torrents/get?id=
pub async fn get_torrent(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TorrentIdParams>,
) -> Result<Json<TorrentRecord>, ApiError> {
    let engine = require_engine(&state)?;
    engine
        .get_torrent(&params.id)
        .await
        .map(Json)
        .map_err(sync_error)
}

/// POST /api/v1/torrents/add?id=
///
/// Submit a single torrent without binding it to a title.
pub async fn add_torrent(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TorrentIdParams>,
) -> Result<Json<OperationResult>, ApiError> {
    let engine = require_engine(&state)?;
    Ok(Json(engine.add_torrent(&params.id).await))
}

/// GET /api/v1/downloads
pub async fn list_downloads(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SubmitHandle>>, ApiError> {
    let engine = require_engine(&state)?;
    engine.list_downloads().await.map(Json).map_err(sync_error)
}
