//! End-to-end API tests with mock listing source and download client.

mod common;

use axum::http::StatusCode;

use common::{fixtures, TestFixture};
use toloka_core::TitleStore;

// =============================================================================
// Health / Config / Metrics
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/api/v1/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    let text = response.body.as_str().unwrap_or_default();
    assert!(text.contains("toloka_http_requests_total"));
    assert!(text.contains("toloka_titles_tracked"));
}

// =============================================================================
// Releases
// =============================================================================

#[tokio::test]
async fn test_add_release_then_list_titles() {
    let fixture = TestFixture::new();
    fixture
        .listing
        .add_record(fixtures::torrent_record(
            "t1",
            "Show - 02 [1080p]",
            2,
            fixtures::published_on(2024, 1, 1),
        ))
        .await;

    let response = fixture
        .post_form(
            "/api/v1/releases",
            "url=https%3A%2F%2Fsource%2Ft1&season=2&index=2&correction=0&title=Show",
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["operation_type"], "AddRelease");
    assert_eq!(response.body["response_code"], "Success");
    assert_eq!(response.body["torrent_references"][0], "t1");
    assert_eq!(response.body["titles_references"][0], "show");
    assert!(response.body["start_time"].is_string());
    assert!(response.body["end_time"].is_string());

    let titles = fixture.get("/api/v1/titles").await;
    assert_eq!(titles.status, StatusCode::OK);
    assert_eq!(titles.body["show"]["last_torrent_reference"], "t1");
    assert_eq!(titles.body["show"]["season"], 2);
}

#[tokio::test]
async fn test_update_release_reports_response_code() {
    let fixture = TestFixture::new();
    fixture
        .titles
        .put(&fixtures::title_record("show", "Show"))
        .unwrap();
    fixture
        .listing
        .add_record(fixtures::torrent_record(
            "t1",
            "Show - 01",
            1,
            fixtures::published_on(2024, 1, 1),
        ))
        .await;

    let first = fixture
        .post_form("/api/v1/releases/update", "codename=show")
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["response_code"], "Success");

    let second = fixture
        .post_form("/api/v1/releases/update", "codename=show")
        .await;
    assert_eq!(second.body["response_code"], "NoNewContent");

    let forced = fixture
        .post_form("/api/v1/releases/update", "codename=show&force=true")
        .await;
    assert_eq!(forced.body["response_code"], "Success");
    assert_eq!(fixture.client.submit_count().await, 2);

    let missing = fixture
        .post_form("/api/v1/releases/update", "codename=missing")
        .await;
    assert_eq!(missing.body["response_code"], "NotFound");
}

#[tokio::test]
async fn test_update_all() {
    let fixture = TestFixture::new();
    let response = fixture.post("/api/v1/releases/update-all").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["operation_type"], "UpdateAll");
    assert_eq!(response.body["response_code"], "NoNewContent");
}

#[tokio::test]
async fn test_add_release_requires_fields() {
    let fixture = TestFixture::new();
    let response = fixture.post_form("/api/v1/releases", "season=1").await;
    assert!(response.status.is_client_error());

    let untitled = fixture
        .post_form(
            "/api/v1/releases",
            "url=https%3A%2F%2Fsource%2Ft1&season=1&index=1",
        )
        .await;
    assert!(untitled.status.is_client_error());
}

#[tokio::test]
async fn test_add_release_with_blank_title_is_client_error() {
    let fixture = TestFixture::new();
    let response = fixture
        .post_form(
            "/api/v1/releases",
            "url=https%3A%2F%2Fsource%2Ft1&season=1&index=1&title=+",
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["response_code"], "ClientError");
    assert!(fixture.titles.list_all().unwrap().is_empty());
}

// =============================================================================
// Torrents
// =============================================================================

#[tokio::test]
async fn test_search_get_and_add_torrent() {
    let fixture = TestFixture::new();
    fixture
        .listing
        .add_record(fixtures::torrent_record(
            "t1",
            "Show - 01",
            1,
            fixtures::published_on(2024, 1, 1),
        ))
        .await;

    let found = fixture.get("/api/v1/torrents/search?query=show").await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body.as_array().unwrap().len(), 1);

    let torrent = fixture.get("/api/v1/torrents/get?id=t1").await;
    assert_eq!(torrent.status, StatusCode::OK);
    assert_eq!(torrent.body["guid"], "t1");

    let missing = fixture.get("/api/v1/torrents/get?id=nope").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert!(missing.body["error"].is_string());

    let added = fixture.post("/api/v1/torrents/add?id=t1").await;
    assert_eq!(added.status, StatusCode::OK);
    assert_eq!(added.body["operation_type"], "AddTorrent");
    assert_eq!(added.body["response_code"], "Success");

    let unknown = fixture.post("/api/v1/torrents/add?id=nope").await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(unknown.body["response_code"], "NotFound");

    let downloads = fixture.get("/api/v1/downloads").await;
    assert_eq!(downloads.status, StatusCode::OK);
    assert_eq!(downloads.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unreachable_client_is_bad_gateway() {
    let fixture = TestFixture::new();
    fixture.client.set_unreachable(true).await;

    let response = fixture.get("/api/v1/downloads").await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
}

// =============================================================================
// Engine not configured
// =============================================================================

#[tokio::test]
async fn test_engine_routes_unavailable_without_engine() {
    let fixture = TestFixture::without_engine();

    let update = fixture.post("/api/v1/releases/update-all").await;
    assert_eq!(update.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(update.body["error"].is_string());

    let search = fixture.get("/api/v1/torrents/search?query=x").await;
    assert_eq!(search.status, StatusCode::SERVICE_UNAVAILABLE);

    // Titles are served from the store regardless.
    let titles = fixture.get("/api/v1/titles").await;
    assert_eq!(titles.status, StatusCode::OK);
    assert!(titles.body.as_object().unwrap().is_empty());
}
