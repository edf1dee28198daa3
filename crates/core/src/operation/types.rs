//! Operation result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of engine operation an [`OperationResult`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    AddRelease,
    UpdateOne,
    UpdateAll,
    Search,
    AddTorrent,
}

impl OperationType {
    /// Returns the string representation for metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::AddRelease => "add_release",
            OperationType::UpdateOne => "update_one",
            OperationType::UpdateAll => "update_all",
            OperationType::Search => "search",
            OperationType::AddTorrent => "add_torrent",
        }
    }
}

/// Outcome classification of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseCode {
    Success,
    PartialSuccess,
    NoNewContent,
    NotFound,
    ClientError,
    SourceError,
}

impl ResponseCode {
    /// Returns the string representation for metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::Success => "success",
            ResponseCode::PartialSuccess => "partial_success",
            ResponseCode::NoNewContent => "no_new_content",
            ResponseCode::NotFound => "not_found",
            ResponseCode::ClientError => "client_error",
            ResponseCode::SourceError => "source_error",
        }
    }

    /// Whether the operation failed outright.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ResponseCode::NotFound | ResponseCode::ClientError | ResponseCode::SourceError
        )
    }
}

/// Audit record returned by every engine operation.
///
/// Built through [`super::OperationRecorder`]; once handed to the caller it is
/// not mutated again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub operation_type: OperationType,
    /// Torrent guids touched, in processing order.
    pub torrent_references: Vec<String>,
    /// Codenames touched, in processing order.
    #[serde(rename = "titles_references")]
    pub title_references: Vec<String>,
    pub status_message: String,
    pub response_code: ResponseCode,
    pub operation_logs: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_serialized_field_names_match_contract() {
        let result = OperationResult {
            operation_type: OperationType::UpdateAll,
            torrent_references: vec!["t1".to_string()],
            title_references: vec!["show".to_string()],
            status_message: "done".to_string(),
            response_code: ResponseCode::PartialSuccess,
            operation_logs: vec!["step".to_string()],
            start_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 5).unwrap(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["operation_type"], "UpdateAll");
        assert_eq!(json["response_code"], "PartialSuccess");
        assert_eq!(json["torrent_references"][0], "t1");
        assert_eq!(json["titles_references"][0], "show");
        assert_eq!(json["status_message"], "done");
        assert_eq!(json["operation_logs"][0], "step");
        assert_eq!(json["start_time"], "2024-01-01T00:00:00Z");
        assert_eq!(json["end_time"], "2024-01-01T00:00:05Z");
        assert!(json.get("title_references").is_none());
    }

    #[test]
    fn test_failure_codes() {
        assert!(ResponseCode::NotFound.is_failure());
        assert!(ResponseCode::ClientError.is_failure());
        assert!(ResponseCode::SourceError.is_failure());
        assert!(!ResponseCode::PartialSuccess.is_failure());
        assert!(!ResponseCode::NoNewContent.is_failure());
        assert!(!ResponseCode::Success.is_failure());
    }
}
