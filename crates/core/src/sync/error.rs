//! Engine error type.

use thiserror::Error;

use crate::download_client::DownloadClientError;
use crate::listing::ListingError;
use crate::matcher::MatchError;
use crate::operation::ResponseCode;
use crate::titles::TitleStoreError;

/// Failure of a whole engine operation (or of one item inside a batch).
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Title not found: {0}")]
    TitleNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Listing source error: {0}")]
    Source(#[from] ListingError),

    #[error("Download client error: {0}")]
    Client(#[from] DownloadClientError),

    #[error("Episode match error: {0}")]
    Match(#[from] MatchError),

    #[error("Title store error: {0}")]
    Store(#[from] TitleStoreError),
}

impl SyncError {
    /// Response code an operation ends with when it fails with this error.
    pub fn response_code(&self) -> ResponseCode {
        match self {
            SyncError::TitleNotFound(_) => ResponseCode::NotFound,
            SyncError::Source(_) => ResponseCode::SourceError,
            SyncError::InvalidRequest(_)
            | SyncError::Client(_)
            | SyncError::Match(_)
            | SyncError::Store(_) => ResponseCode::ClientError,
        }
    }
}
