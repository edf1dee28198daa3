use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, releases, torrents};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Tracked releases
        .route("/releases", post(releases::add_release))
        .route("/releases/update", post(releases::update_release))
        .route("/releases/update-all", post(releases::update_all))
        .route("/titles", get(releases::list_titles))
        // Listing source and download client passthrough
        .route("/torrents/search", get(torrents::search))
        .route("/torrents/get", get(torrents::get_torrent))
        .route("/torrents/add", post(torrents::add_torrent))
        .route("/downloads", get(torrents::list_downloads))
        .route_layer(middleware::from_fn(super::middleware::metrics_middleware))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
}
