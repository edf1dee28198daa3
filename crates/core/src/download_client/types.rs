//! Types for download client operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::listing::TorrentRecord;

/// Errors that can occur during download client operations.
#[derive(Debug, Error)]
pub enum DownloadClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Submission rejected: {0}")]
    Rejected(String),

    #[error("Invalid torrent data: {0}")]
    InvalidTorrent(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

/// Per-submission options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Save path override.
    pub download_dir: Option<String>,
    /// Category/label.
    pub category: Option<String>,
}

/// A torrent as known to the download client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitHandle {
    /// Info hash when known, otherwise the listing source guid.
    pub id: String,
    /// Torrent name (may be unknown for magnets initially).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Trait for download client backends.
#[async_trait]
pub trait DownloadClient: Send + Sync {
    /// Backend name for logging/metrics.
    fn name(&self) -> &str;

    /// Hand a torrent to the client.
    async fn submit(
        &self,
        torrent: &TorrentRecord,
        options: &SubmitOptions,
    ) -> Result<SubmitHandle, DownloadClientError>;

    /// Torrents currently managed by the client.
    async fn list(&self) -> Result<Vec<SubmitHandle>, DownloadClientError>;
}

/// Extract the info hash from a magnet URI, lowercased.
pub fn extract_hash_from_magnet(uri: &str) -> Option<String> {
    let query = uri.strip_prefix("magnet:?")?;
    query
        .split('&')
        .find_map(|part| part.strip_prefix("xt=urn:btih:"))
        .filter(|hash| !hash.is_empty())
        .map(|hash| hash.to_lowercase())
}

/// Best identifier for a submitted torrent: its info hash, else its guid.
pub fn handle_id(torrent: &TorrentRecord, uri: &str) -> String {
    torrent
        .info_hash
        .as_ref()
        .map(|h| h.to_lowercase())
        .or_else(|| extract_hash_from_magnet(uri))
        .unwrap_or_else(|| torrent.guid.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_extract_hash_from_magnet() {
        assert_eq!(
            extract_hash_from_magnet("magnet:?xt=urn:btih:ABC123&dn=Show").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            extract_hash_from_magnet("magnet:?dn=Show&xt=urn:btih:def").as_deref(),
            Some("def")
        );
        assert!(extract_hash_from_magnet("https://source/t1.torrent").is_none());
        assert!(extract_hash_from_magnet("magnet:?dn=Show").is_none());
    }

    #[test]
    fn test_handle_id_falls_back_to_guid() {
        let torrent = TorrentRecord {
            guid: "t42".to_string(),
            raw_title: "Show 01".to_string(),
            published_episode: 1,
            publish_date: Utc::now(),
            download_url: Some("https://source/t42.torrent".to_string()),
            info_hash: None,
            details_url: None,
            size_bytes: None,
        };
        assert_eq!(handle_id(&torrent, "https://source/t42.torrent"), "t42");
        assert_eq!(handle_id(&torrent, "magnet:?xt=urn:btih:FFEE"), "ffee");
    }

    #[test]
    fn test_submit_handle_serialization() {
        let handle = SubmitHandle {
            id: "abc".to_string(),
            name: None,
        };
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, r#"{"id":"abc"}"#);
    }
}
