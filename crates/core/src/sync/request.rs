//! Engine request types.
//!
//! Each operation carries only the fields it uses. Optional inputs are
//! `Option`, never sentinel values.

use serde::{Deserialize, Serialize};

/// Bind a new title from a listing-source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddReleaseRequest {
    /// Listing-source URL (or id) of a torrent of the title.
    pub url: String,
    pub season: u32,
    /// Episode number the torrent at `url` is published as.
    pub index: i32,
    /// Offset added to published episode numbers.
    #[serde(default)]
    pub correction: i32,
    /// Display title, also the search key for later episodes. Must not be
    /// blank.
    pub title: String,
    /// Codename; derived from the title when absent.
    #[serde(default)]
    pub codename: Option<String>,
    /// Only follow releases from this group.
    #[serde(default)]
    pub release_group: Option<String>,
    /// Save path for this title's downloads.
    #[serde(default)]
    pub download_dir: Option<String>,
}

/// Look for new episodes of one tracked title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReleaseRequest {
    pub codename: String,
    /// Resubmit the newest candidate even if it was already accepted.
    #[serde(default)]
    pub force: bool,
}

impl UpdateReleaseRequest {
    pub fn new(codename: impl Into<String>) -> Self {
        Self {
            codename: codename.into(),
            force: false,
        }
    }

    pub fn forced(codename: impl Into<String>) -> Self {
        Self {
            codename: codename.into(),
            force: true,
        }
    }
}

/// An engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum SyncRequest {
    AddRelease(AddReleaseRequest),
    UpdateRelease(UpdateReleaseRequest),
    UpdateAll,
    Search { query: String },
    AddTorrent { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_request_deserialization() {
        let json = r#"{"operation":"update_release","codename":"show"}"#;
        let request: SyncRequest = serde_json::from_str(json).unwrap();
        assert_eq!(
            request,
            SyncRequest::UpdateRelease(UpdateReleaseRequest::new("show"))
        );

        let json = r#"{"operation":"update_all"}"#;
        let request: SyncRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request, SyncRequest::UpdateAll);
    }

    #[test]
    fn test_add_release_optional_fields() {
        let json = r#"{"url":"https://source/t1","season":2,"index":2,"title":"Show"}"#;
        let request: AddReleaseRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.correction, 0);
        assert_eq!(request.title, "Show");
        assert!(request.codename.is_none());
    }

    #[test]
    fn test_add_release_requires_title() {
        let json = r#"{"url":"https://source/t1","season":2,"index":2}"#;
        assert!(serde_json::from_str::<AddReleaseRequest>(json).is_err());
    }
}
