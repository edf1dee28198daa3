//! Embedded librqbit download client implementation.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use librqbit::{
    AddTorrent as RqbitAddTorrent, AddTorrentOptions, AddTorrentResponse, Session,
    SessionOptions, SessionPersistenceConfig,
};
use tracing::{debug, info, warn};

use crate::config::LibrqbitConfig;
use crate::listing::TorrentRecord;

use super::{DownloadClient, DownloadClientError, SubmitHandle, SubmitOptions};

/// Download client running an in-process librqbit session.
pub struct LibrqbitClient {
    session: Arc<Session>,
}

fn ensure_dir(path: &PathBuf, what: &str) -> Result<(), DownloadClientError> {
    if path.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|e| {
        DownloadClientError::ConnectionFailed(format!("Failed to create {} directory: {}", what, e))
    })
}

impl LibrqbitClient {
    /// Start a librqbit session from configuration.
    pub async fn new(config: &LibrqbitConfig) -> Result<Self, DownloadClientError> {
        let download_path = PathBuf::from(&config.download_path);
        ensure_dir(&download_path, "download")?;

        let mut opts = SessionOptions::default();
        if !config.enable_dht {
            opts.disable_dht = true;
        }
        if let Some(port) = config.listen_port {
            opts.listen_port_range = Some(port..(port + 1));
        }
        if let Some(ref persistence_path) = config.persistence_path {
            let persistence_dir = PathBuf::from(persistence_path);
            ensure_dir(&persistence_dir, "persistence")?;
            opts.persistence = Some(SessionPersistenceConfig::Json {
                folder: Some(persistence_dir),
            });
        }

        info!(
            download_path = %download_path.display(),
            dht_enabled = !opts.disable_dht,
            "Initializing librqbit session"
        );

        let session = Session::new_with_opts(download_path, opts)
            .await
            .map_err(|e| {
                DownloadClientError::ConnectionFailed(format!(
                    "Failed to initialize librqbit session: {}",
                    e
                ))
            })?;

        Ok(Self { session })
    }

    /// Format info hash as lowercase hex string.
    fn format_hash(hash: &librqbit_core::Id20) -> String {
        hash.as_string()
    }
}

#[async_trait]
impl DownloadClient for LibrqbitClient {
    fn name(&self) -> &str {
        "librqbit"
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

        let opts = options.download_dir.as_ref().map(|dir| AddTorrentOptions {
            output_folder: Some(dir.clone()),
            ..Default::default()
        });

        let response = self
            .session
            .add_torrent(RqbitAddTorrent::from_url(&uri), opts)
            .await
            .map_err(|e| DownloadClientError::Rejected(format!("Failed to add torrent: {}", e)))?;

        match response {
            AddTorrentResponse::Added(_, handle) => {
                let id = Self::format_hash(&handle.info_hash());
                debug!(guid = %torrent.guid, hash = %id, "Torrent added to librqbit");
                Ok(SubmitHandle {
                    id,
                    name: handle.name().map(|s| s.to_string()),
                })
            }
            AddTorrentResponse::AlreadyManaged(_, handle) => {
                let id = Self::format_hash(&handle.info_hash());
                warn!(guid = %torrent.guid, hash = %id, "Torrent already managed by librqbit");
                Ok(SubmitHandle {
                    id,
                    name: handle.name().map(|s| s.to_string()),
                })
            }
            AddTorrentResponse::ListOnly(_) => Err(DownloadClientError::Rejected(
                "Torrent was added in list-only mode".to_string(),
            )),
        }
    }

    async fn list(&self) -> Result<Vec<SubmitHandle>, DownloadClientError> {
        Ok(self.session.with_torrents(|iter| {
            iter.map(|(_, torrent)| SubmitHandle {
                id: Self::format_hash(&torrent.info_hash()),
                name: torrent.name().map(|s| s.to_string()),
            })
            .collect()
        }))
    }
}
