//! Mock listing source for testing.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::listing::{ListingError, ListingSource, TorrentRecord};

/// Mock implementation of the ListingSource trait.
///
/// Provides controllable behavior for testing:
/// - Serve a fixed set of records
/// - Fail specific queries or the next call
/// - Delay responses to exercise timeouts
/// - Record the queries that were made
#[derive(Debug, Default)]
pub struct MockListingSource {
    /// Records served by search and fetch.
    records: Arc<RwLock<Vec<TorrentRecord>>>,
    /// Queries that fail with a connection error.
    failing_queries: Arc<RwLock<HashSet<String>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<ListingError>>>,
    /// Applied before every response.
    delay: Arc<RwLock<Option<Duration>>>,
    /// Recorded search queries.
    searches: Arc<RwLock<Vec<String>>>,
}

impl MockListingSource {
    /// Create an empty mock listing source.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_record(&self, record: TorrentRecord) {
        self.records.write().await.push(record);
    }

    /// Make searches for `query` fail until cleared.
    pub async fn fail_query(&self, query: impl Into<String>) {
        self.failing_queries.write().await.insert(query.into());
    }

    pub async fn clear_failures(&self) {
        self.failing_queries.write().await.clear();
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: ListingError) {
        *self.next_error.write().await = Some(error);
    }

    /// Delay every response by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Get all recorded search queries.
    pub async fn searches(&self) -> Vec<String> {
        self.searches.read().await.clone()
    }

    async fn before_call(&self) -> Result<(), ListingError> {
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ListingSource for MockListingSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str) -> Result<Vec<TorrentRecord>, ListingError> {
        self.searches.write().await.push(query.to_string());
        self.before_call().await?;

        if self.failing_queries.read().await.contains(query) {
            return Err(ListingError::ConnectionFailed(format!(
                "mock search for '{}' failed",
                query
            )));
        }

        // Loose like a real tracker search: any query word may hit.
        let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| {
                let title = r.raw_title.to_lowercase();
                words.iter().any(|w| title.contains(w.as_str()))
            })
            .cloned()
            .collect())
    }

    async fn fetch(&self, id: &str) -> Result<TorrentRecord, ListingError> {
        self.before_call().await?;

        self.records
            .read()
            .await
            .iter()
            .find(|r| r.guid == id || r.details_url.as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| ListingError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{published_on, torrent_record};

    #[tokio::test]
    async fn test_search_and_fetch() {
        let source = MockListingSource::new();
        source
            .add_record(torrent_record("t1", "Show 01", 1, published_on(2024, 1, 1)))
            .await;

        let found = source.search("SHOW").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(source.fetch("https://source/t1").await.unwrap().guid, "t1");
        assert_eq!(source.fetch("t1").await.unwrap().guid, "t1");
        assert!(matches!(
            source.fetch("t2").await,
            Err(ListingError::NotFound(_))
        ));
        assert_eq!(source.searches().await, vec!["SHOW"]);
    }

    #[tokio::test]
    async fn test_failures() {
        let source = MockListingSource::new();
        source.fail_query("bad").await;
        assert!(source.search("bad").await.is_err());
        assert!(source.search("good").await.is_ok());

        source.set_next_error(ListingError::Timeout).await;
        assert!(matches!(
            source.search("good").await,
            Err(ListingError::Timeout)
        ));
        assert!(source.search("good").await.is_ok());
    }
}
