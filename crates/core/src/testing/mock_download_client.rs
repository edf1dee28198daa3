//! Mock download client for testing.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::download_client::{
    handle_id, DownloadClient, DownloadClientError, SubmitHandle, SubmitOptions,
};
use crate::listing::TorrentRecord;

/// A recorded submission for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSubmit {
    /// The torrent that was submitted.
    pub torrent: TorrentRecord,
    pub options: SubmitOptions,
    /// When the submission was made.
    pub timestamp: chrono::DateTime<Utc>,
}

/// Mock implementation of the DownloadClient trait.
///
/// Records every accepted submission in order. Failures can be injected for
/// the next call, for specific guids, or for everything (`set_unreachable`).
///
/// # Example
///
/// ```rust,ignore
/// let client = MockDownloadClient::new();
/// client.fail_guid("t2").await;
///
/// // ... run the engine ...
///
/// assert_eq!(client.submitted_guids().await, vec!["t1"]);
/// ```
#[derive(Debug, Default)]
pub struct MockDownloadClient {
    /// Accepted submissions.
    submitted: Arc<RwLock<Vec<RecordedSubmit>>>,
    /// Guids the client refuses.
    failing_guids: Arc<RwLock<HashSet<String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<DownloadClientError>>>,
    /// Every call fails with a connection error while set.
    unreachable: Arc<RwLock<bool>>,
    /// Applied before every submission.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockDownloadClient {
    /// Create a new mock download client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded submissions.
    pub async fn submissions(&self) -> Vec<RecordedSubmit> {
        self.submitted.read().await.clone()
    }

    /// Guids of accepted submissions, in submission order.
    pub async fn submitted_guids(&self) -> Vec<String> {
        self.submitted
            .read()
            .await
            .iter()
            .map(|s| s.torrent.guid.clone())
            .collect()
    }

    pub async fn submit_count(&self) -> usize {
        self.submitted.read().await.len()
    }

    /// Clear recorded submissions.
    pub async fn clear_recorded(&self) {
        self.submitted.write().await.clear();
    }

    /// Refuse submissions of `guid`.
    pub async fn fail_guid(&self, guid: impl Into<String>) {
        self.failing_guids.write().await.insert(guid.into());
    }

    pub async fn clear_failures(&self) {
        self.failing_guids.write().await.clear();
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: DownloadClientError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.write().await = unreachable;
    }

    /// Delay every submission by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    async fn check_available(&self) -> Result<(), DownloadClientError> {
        if *self.unreachable.read().await {
            return Err(DownloadClientError::ConnectionFailed(
                "mock client unreachable".to_string(),
            ));
        }
        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DownloadClient for MockDownloadClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(
        &self,
        torrent: &TorrentRecord,
        options: &SubmitOptions,
    ) -> Result<SubmitHandle, DownloadClientError> {
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_available().await?;

        if self.failing_guids.read().await.contains(&torrent.guid) {
            return Err(DownloadClientError::Rejected(format!(
                "mock client refused {}",
                torrent.guid
            )));
        }

        let id = match torrent.source_uri() {
            Some(uri) => handle_id(torrent, &uri),
            None => torrent.guid.clone(),
        };

        self.submitted.write().await.push(RecordedSubmit {
            torrent: torrent.clone(),
            options: options.clone(),
            timestamp: Utc::now(),
        });

        Ok(SubmitHandle {
            id,
            name: Some(torrent.raw_title.clone()),
        })
    }

    async fn list(&self) -> Result<Vec<SubmitHandle>, DownloadClientError> {
        self.check_available().await?;

        Ok(self
            .submitted
            .read()
            .await
            .iter()
            .map(|s| SubmitHandle {
                id: s.torrent.guid.clone(),
                name: Some(s.torrent.raw_title.clone()),
            })
            .collect())
    }
}
