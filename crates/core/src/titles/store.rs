//! Title storage trait.

use thiserror::Error;

use super::TitleRecord;

/// Error type for title store operations.
#[derive(Debug, Error)]
pub enum TitleStoreError {
    /// Backing store failure.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be turned back into a record.
    #[error("Corrupt title record {codename}: {reason}")]
    Corrupt { codename: String, reason: String },
}

/// Trait for title storage backends.
///
/// The engine reads and writes tracking state only through this trait.
pub trait TitleStore: Send + Sync {
    /// Get a title by codename.
    fn get(&self, codename: &str) -> Result<Option<TitleRecord>, TitleStoreError>;

    /// Insert or replace a title. Writing an identical record changes nothing.
    fn put(&self, record: &TitleRecord) -> Result<(), TitleStoreError>;

    /// All titles, in the order they were first stored.
    fn list_all(&self) -> Result<Vec<TitleRecord>, TitleStoreError>;

    /// Codename bound to a listing-source URL, if any.
    fn resolve_by_url(&self, url: &str) -> Result<Option<String>, TitleStoreError>;
}
