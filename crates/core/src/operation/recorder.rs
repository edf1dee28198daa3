//! Builder for [`OperationResult`].

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::metrics::{SYNC_OPERATIONS, SYNC_OPERATION_DURATION};

use super::{OperationResult, OperationType, ResponseCode};

/// Collects references and log lines for one operation.
///
/// Owned by a single engine call; [`finish`](Self::finish) consumes it, so a
/// finished result cannot be touched again.
#[derive(Debug)]
pub struct OperationRecorder {
    operation_type: OperationType,
    started_at: DateTime<Utc>,
    torrent_references: Vec<String>,
    title_references: Vec<String>,
    logs: Vec<String>,
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

impl OperationRecorder {
    /// Begin recording an operation.
    pub fn start(operation_type: OperationType) -> Self {
        Self {
            operation_type,
            started_at: Utc::now(),
            torrent_references: Vec::new(),
            title_references: Vec::new(),
            logs: Vec::new(),
        }
    }

    /// Append a diagnostic line.
    pub fn log_step(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(operation = self.operation_type.as_str(), "{}", message);
        self.logs.push(message);
    }

    /// Note a torrent guid. Only the first occurrence is kept.
    pub fn touch_torrent(&mut self, reference: &str) {
        push_unique(&mut self.torrent_references, reference);
    }

    /// Note a codename. Only the first occurrence is kept.
    pub fn touch_title(&mut self, codename: &str) {
        push_unique(&mut self.title_references, codename);
    }

    /// Fold a finished per-title result into this aggregate.
    pub fn absorb(&mut self, codename: &str, result: &OperationResult) {
        for reference in &result.torrent_references {
            self.touch_torrent(reference);
        }
        for title in &result.title_references {
            self.touch_title(title);
        }
        for line in &result.operation_logs {
            self.logs.push(format!("[{}] {}", codename, line));
        }
    }

    /// Freeze the record.
    pub fn finish(self, code: ResponseCode, message: impl Into<String>) -> OperationResult {
        let end_time = Utc::now().max(self.started_at);
        let status_message = message.into();

        let elapsed = (end_time - self.started_at).num_milliseconds() as f64 / 1000.0;
        SYNC_OPERATIONS
            .with_label_values(&[self.operation_type.as_str(), code.as_str()])
            .inc();
        SYNC_OPERATION_DURATION
            .with_label_values(&[self.operation_type.as_str()])
            .observe(elapsed);

        info!(
            operation = self.operation_type.as_str(),
            response_code = code.as_str(),
            torrents = self.torrent_references.len(),
            titles = self.title_references.len(),
            "{}",
            status_message
        );

        OperationResult {
            operation_type: self.operation_type,
            torrent_references: self.torrent_references,
            title_references: self.title_references,
            status_message,
            response_code: code,
            operation_logs: self.logs,
            start_time: self.started_at,
            end_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_keep_first_occurrence_order() {
        let mut recorder = OperationRecorder::start(OperationType::UpdateOne);
        recorder.touch_torrent("t2");
        recorder.touch_torrent("t1");
        recorder.touch_torrent("t2");
        recorder.touch_title("show");
        recorder.touch_title("show");

        let result = recorder.finish(ResponseCode::Success, "ok");
        assert_eq!(result.torrent_references, vec!["t2", "t1"]);
        assert_eq!(result.title_references, vec!["show"]);
    }

    #[test]
    fn test_logs_are_kept_in_order() {
        let mut recorder = OperationRecorder::start(OperationType::Search);
        recorder.log_step("first");
        recorder.log_step("second");
        recorder.log_step("first");

        let result = recorder.finish(ResponseCode::NoNewContent, "nothing");
        assert_eq!(result.operation_logs, vec!["first", "second", "first"]);
        assert_eq!(result.operation_type, OperationType::Search);
        assert_eq!(result.response_code, ResponseCode::NoNewContent);
        assert_eq!(result.status_message, "nothing");
    }

    #[test]
    fn test_end_time_not_before_start_time() {
        let result = OperationRecorder::start(OperationType::AddTorrent)
            .finish(ResponseCode::Success, "ok");
        assert!(result.end_time >= result.start_time);
    }

    #[test]
    fn test_absorb_prefixes_logs_and_dedups_references() {
        let mut inner = OperationRecorder::start(OperationType::UpdateOne);
        inner.touch_title("a");
        inner.touch_torrent("t1");
        inner.log_step("submitted t1");
        let inner = inner.finish(ResponseCode::Success, "ok");

        let mut outer = OperationRecorder::start(OperationType::UpdateAll);
        outer.touch_torrent("t1");
        outer.absorb("a", &inner);

        let result = outer.finish(ResponseCode::Success, "ok");
        assert_eq!(result.torrent_references, vec!["t1"]);
        assert_eq!(result.title_references, vec!["a"]);
        assert_eq!(result.operation_logs, vec!["[a] submitted t1"]);
    }
}
