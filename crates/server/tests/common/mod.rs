//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock dependencies injected, enabling E2E testing without a real
//! listing source or download client.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use toloka_core::{
    testing::{MockDownloadClient, MockListingSource},
    Config, DatabaseConfig, ServerConfig, SqliteTitleStore, SyncConfig, SyncContext, SyncEngine,
    TitleStore,
};

/// Re-export fixtures for test convenience
pub use toloka_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_add_release() {
///     let fixture = TestFixture::new();
///     let response = fixture
///         .post_form("/api/v1/releases", "url=t1&season=1&index=1")
///         .await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Title store backing the server
    pub titles: Arc<SqliteTitleStore>,
    /// Mock listing source - configure published torrents
    pub listing: Arc<MockListingSource>,
    /// Mock download client - inspect submissions
    pub client: Arc<MockDownloadClient>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture with a configured engine.
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Create a fixture without listing source or download client.
    pub fn without_engine() -> Self {
        Self::build(false)
    }

    fn build(with_engine: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let listing = Arc::new(MockListingSource::new());
        let client = Arc::new(MockDownloadClient::new());
        let titles =
            Arc::new(SqliteTitleStore::new(&db_path).expect("Failed to create title store"));

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            listing: None,
            download_client: None,
            sync: SyncConfig::default(),
        };

        let engine = with_engine.then(|| {
            Arc::new(SyncEngine::new(SyncContext {
                config: config.sync.clone(),
                titles: Arc::clone(&titles) as Arc<dyn TitleStore>,
                listing: Arc::clone(&listing) as Arc<dyn toloka_core::ListingSource>,
                client: Arc::clone(&client) as Arc<dyn toloka_core::DownloadClient>,
            }))
        });

        let state = Arc::new(toloka_server::state::AppState::new(
            config,
            Arc::clone(&titles) as Arc<dyn TitleStore>,
            engine,
        ));

        let router = toloka_server::api::create_router(state);

        Self {
            router,
            titles,
            listing,
            client,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with an empty body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with a urlencoded form body.
    pub async fn post_form(&self, path: &str, form: &str) -> TestResponse {
        self.request("POST", path, Some(form)).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, form: Option<&str>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(form) = form {
            request_builder =
                request_builder.header("Content-Type", "application/x-www-form-urlencoded");
            Body::from(form.to_string())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into()))
        };

        TestResponse { status, body }
    }
}
