//! Types for the listing source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A torrent as published on the listing source.
///
/// Records are immutable once fetched and are only held for the duration of
/// one synchronization call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentRecord {
    /// Unique identifier at the source.
    pub guid: String,
    /// Title as published, with the episode number embedded.
    pub raw_title: String,
    /// Episode number as published by the source.
    pub published_episode: i32,
    /// When the torrent was published.
    pub publish_date: DateTime<Utc>,
    /// Direct .torrent download URL or magnet URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Info hash (lowercase hex), when the source exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
    /// Link to the torrent's page on the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details_url: Option<String>,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl TorrentRecord {
    /// URI a download client can fetch: the download URL, else a magnet built
    /// from the info hash.
    pub fn source_uri(&self) -> Option<String> {
        if let Some(url) = self.download_url.as_ref().filter(|u| !u.is_empty()) {
            return Some(url.clone());
        }
        self.info_hash
            .as_ref()
            .filter(|h| !h.is_empty())
            .map(|hash| {
                format!(
                    "magnet:?xt=urn:btih:{}&dn={}",
                    hash.to_lowercase(),
                    urlencoding::encode(&self.raw_title)
                )
            })
    }
}

/// Errors that can occur while talking to the listing source.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("Listing source connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Listing source API error: {0}")]
    ApiError(String),

    #[error("Torrent not found at listing source: {0}")]
    NotFound(String),

    #[error("Malformed record from listing source: {0}")]
    InvalidRecord(String),

    #[error("Request timeout")]
    Timeout,
}

/// Trait for listing source backends.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Free-text search for torrents.
    async fn search(&self, query: &str) -> Result<Vec<TorrentRecord>, ListingError>;

    /// Fetch a single torrent by id or by its page URL.
    async fn fetch(&self, id: &str) -> Result<TorrentRecord, ListingError>;
}
