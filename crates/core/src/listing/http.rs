//! HTTP/JSON listing source backend.
//!
//! Talks to the listing API that fronts the tracker. The API already returns
//! structured records, so nothing here parses markup.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use crate::config::ListingConfig;

use super::{ListingError, ListingSource, TorrentRecord};

/// Listing source backed by the tracker's JSON API.
pub struct HttpListingSource {
    client: Client,
    config: ListingConfig,
}

impl HttpListingSource {
    /// Create a new listing source client.
    pub fn new(config: ListingConfig) -> Result<Self, ListingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| ListingError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/api/search?query={}",
            self.base_url(),
            urlencoding::encode(query)
        )
    }

    fn fetch_url(&self, id: &str) -> String {
        format!("{}/api/torrent?id={}", self.base_url(), urlencoding::encode(id))
    }

    async fn get(&self, url: &str) -> Result<Response, ListingError> {
        let mut request = self.client.get(url);
        if let Some(key) = self.config.api_key.as_ref().filter(|k| !k.is_empty()) {
            request = request.header("X-Api-Key", key);
        }

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                ListingError::Timeout
            } else if e.is_connect() {
                ListingError::ConnectionFailed(e.to_string())
            } else {
                ListingError::ApiError(e.to_string())
            }
        })
    }
}

async fn error_for_status(response: Response) -> ListingError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ListingError::ApiError(format!(
        "HTTP {}: {}",
        status,
        body.chars().take(200).collect::<String>()
    ))
}

#[async_trait]
impl ListingSource for HttpListingSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn search(&self, query: &str) -> Result<Vec<TorrentRecord>, ListingError> {
        debug!(query = query, "Searching listing source");

        let response = self.get(&self.search_url(query)).await?;
        if !response.status().is_success() {
            return Err(error_for_status(response).await);
        }

        let records: Vec<TorrentRecord> = response
            .json()
            .await
            .map_err(|e| ListingError::InvalidRecord(format!("Failed to parse response: {}", e)))?;

        debug!(query = query, results = records.len(), "Listing search complete");
        Ok(records)
    }

    async fn fetch(&self, id: &str) -> Result<TorrentRecord, ListingError> {
        debug!(id = id, "Fetching torrent from listing source");

        let response = self.get(&self.fetch_url(id)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ListingError::NotFound(id.to_string()));
        }
        if !response.status().is_success() {
            return Err(error_for_status(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ListingError::InvalidRecord(format!("Failed to parse response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str) -> HttpListingSource {
        HttpListingSource::new(ListingConfig {
            url: url.to_string(),
            api_key: None,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_search_url_encodes_query() {
        let s = source("http://localhost:5000/");
        assert_eq!(
            s.search_url("Tsukimichi -Moonlit Fantasy-"),
            "http://localhost:5000/api/search?query=Tsukimichi%20-Moonlit%20Fantasy-"
        );
    }

    #[test]
    fn test_fetch_url_accepts_page_urls() {
        let s = source("http://localhost:5000");
        assert_eq!(
            s.fetch_url("https://toloka.to/t675888"),
            "http://localhost:5000/api/torrent?id=https%3A%2F%2Ftoloka.to%2Ft675888"
        );
    }

    #[tokio::test]
    async fn test_unreachable_source_reports_connection_error() {
        // Port 9 (discard) is closed on test machines.
        let s = source("http://127.0.0.1:9");
        let err = s.search("anything").await.unwrap_err();
        assert!(matches!(
            err,
            ListingError::ConnectionFailed(_) | ListingError::ApiError(_) | ListingError::Timeout
        ));
    }
}
