//! Testing utilities and mock implementations.
//!
//! Mocks for the listing source and download client let the engine run
//! end to end without network access. Pair them with
//! [`SqliteTitleStore::in_memory`](crate::titles::SqliteTitleStore::in_memory).
//!
//! # Example
//!
//! ```rust,ignore
//! use toloka_core::testing::{fixtures, MockDownloadClient, MockListingSource};
//!
//! let listing = MockListingSource::new();
//! listing
//!     .add_record(fixtures::torrent_record("t1", "Show 01", 1, fixtures::published_on(2024, 1, 1)))
//!     .await;
//!
//! let client = MockDownloadClient::new();
//! // ... run the engine ...
//! assert_eq!(client.submitted_guids().await, vec!["t1"]);
//! ```

mod mock_download_client;
mod mock_listing_source;

pub use mock_download_client::{MockDownloadClient, RecordedSubmit};
pub use mock_listing_source::MockListingSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::listing::TorrentRecord;
    use crate::titles::TitleRecord;

    /// Midnight UTC on the given day.
    pub fn published_on(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// A torrent whose details page is `https://source/<guid>`.
    pub fn torrent_record(
        guid: &str,
        raw_title: &str,
        published_episode: i32,
        publish_date: DateTime<Utc>,
    ) -> TorrentRecord {
        TorrentRecord {
            guid: guid.to_string(),
            raw_title: raw_title.to_string(),
            published_episode,
            publish_date,
            download_url: Some(format!("https://source/download/{}.torrent", guid)),
            info_hash: None,
            details_url: Some(format!("https://source/{}", guid)),
            size_bytes: Some(1024 * 1024 * 350), // 350 MB
        }
    }

    /// A tracked title with no accepted torrent yet.
    pub fn title_record(codename: &str, display_title: &str) -> TitleRecord {
        TitleRecord::new(
            codename,
            display_title,
            1,
            0,
            format!("https://source/bound/{}", codename),
        )
    }
}
