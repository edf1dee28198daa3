//! qBittorrent download client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::QBittorrentConfig;
use crate::listing::TorrentRecord;

use super::{handle_id, DownloadClient, DownloadClientError, SubmitHandle, SubmitOptions};

/// qBittorrent Web API v2 client.
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    /// Set once logged in; the cookie itself lives in the reqwest jar.
    authenticated: RwLock<bool>,
}

fn map_send_error(e: reqwest::Error) -> DownloadClientError {
    if e.is_timeout() {
        DownloadClientError::Timeout
    } else if e.is_connect() {
        DownloadClientError::ConnectionFailed(e.to_string())
    } else {
        DownloadClientError::ApiError(e.to_string())
    }
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: QBittorrentConfig) -> Result<Self, DownloadClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| DownloadClientError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            authenticated: RwLock::new(false),
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Login and remember that the session cookie is set.
    async fn login(&self) -> Result<(), DownloadClientError> {
        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(self.endpoint("/api/v2/auth/login"))
            .form(&params)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            *self.authenticated.write().await = true;
            Ok(())
        } else if body.contains("Fails.") || status.as_u16() == 403 {
            Err(DownloadClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(DownloadClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    /// Ensure we have a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), DownloadClientError> {
        if *self.authenticated.read().await {
            return Ok(());
        }
        self.login().await
    }

    /// Send an authenticated request, logging in again once if the session expired.
    async fn send<F>(&self, build: F) -> Result<String, DownloadClientError>
    where
        F: Fn() -> RequestBuilder,
    {
        self.ensure_authenticated().await?;

        let mut response: Response = build().send().await.map_err(map_send_error)?;
        if response.status().as_u16() == 403 {
            warn!("qBittorrent session expired, re-authenticating");
            *self.authenticated.write().await = false;
            self.login().await?;
            response = build().send().await.map_err(map_send_error)?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadClientError::ApiError(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| DownloadClientError::ApiError(e.to_string()))
    }

    fn add_form(&self, uri: &str, options: &SubmitOptions) -> multipart::Form {
        let mut form = multipart::Form::new().text("urls", uri.to_string());
        if let Some(path) = options
            .download_dir
            .as_ref()
            .or(self.config.download_path.as_ref())
        {
            form = form.text("savepath", path.clone());
        }
        if let Some(category) = &options.category {
            form = form.text("category", category.clone());
        }
        form
    }
}

/// qBittorrent torrent info response (only the fields we use).
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    name: String,
}

#[async_trait]
impl DownloadClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn submit(
        &self,
        torrent: &TorrentRecord,
        options: &SubmitOptions,
    ) -> Result<SubmitHandle, DownloadClientError> {
        let uri = torrent.source_uri().ok_or_else(|| {
            DownloadClientError::InvalidTorrent(format!(
                "{} has neither a download URL nor an info hash",
                torrent.guid
            ))
        })?;

        // multipart::Form is not Clone, so it is rebuilt for a retry.
        let url = self.endpoint("/api/v2/torrents/add");
        let body = self
            .send(|| self.client.post(&url).multipart(self.add_form(&uri, options)))
            .await?;

        if body.contains("Fails.") {
            return Err(DownloadClientError::Rejected(format!(
                "qBittorrent refused {}",
                torrent.guid
            )));
        }

        debug!(guid = %torrent.guid, "Torrent submitted to qBittorrent");

        Ok(SubmitHandle {
            id: handle_id(torrent, &uri),
            name: Some(torrent.raw_title.clone()),
        })
    }

    async fn list(&self) -> Result<Vec<SubmitHandle>, DownloadClientError> {
        let url = self.endpoint("/api/v2/torrents/info");
        let body = self.send(|| self.client.get(&url)).await?;

        let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&body).map_err(|e| {
            DownloadClientError::ApiError(format!("Failed to parse response: {}", e))
        })?;

        Ok(torrents
            .into_iter()
            .map(|t| SubmitHandle {
                id: t.hash.to_lowercase(),
                name: Some(t.name),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> QBittorrentConfig {
        QBittorrentConfig {
            url: url.to_string(),
            username: "admin".to_string(),
            password: "adminadmin".to_string(),
            timeout_secs: 5,
            download_path: Some("/downloads".to_string()),
        }
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let client = QBittorrentClient::new(config("http://localhost:8081/")).unwrap();
        assert_eq!(
            client.endpoint("/api/v2/torrents/add"),
            "http://localhost:8081/api/v2/torrents/add"
        );
        assert_eq!(client.name(), "qbittorrent");
    }

    #[test]
    fn test_parse_torrent_list() {
        let json = r#"[{"hash":"ABCDEF","name":"Show 01","state":"downloading"}]"#;
        let parsed: Vec<QBTorrentInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed[0].hash, "ABCDEF");
        assert_eq!(parsed[0].name, "Show 01");
    }

    #[tokio::test]
    async fn test_submit_without_uri_is_invalid() {
        let client = QBittorrentClient::new(config("http://127.0.0.1:9")).unwrap();
        let torrent = TorrentRecord {
            guid: "t1".to_string(),
            raw_title: "Show 01".to_string(),
            published_episode: 1,
            publish_date: chrono::Utc::now(),
            download_url: None,
            info_hash: None,
            details_url: None,
            size_bytes: None,
        };
        let err = client
            .submit(&torrent, &SubmitOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadClientError::InvalidTorrent(_)));
    }
}
