//! Capped log of errors reported by front-end pages.
//!
//! Pages capture `window.onerror`, unhandled rejections and `console.error`
//! and post them here so the admin console can show what broke on which
//! screen. Only the newest `capacity` entries are kept.

use std::collections::VecDeque;

use crate::domain::{ClientError, ClientErrorKind};
use crate::error::ApiError;

/// What a page sends; the log assigns id and timestamp.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ErrorReport {
    pub message: String,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "type")]
    pub kind: ClientErrorKind,
}

#[derive(Debug)]
pub struct ErrorLog {
    capacity: usize,
    entries: VecDeque<ClientError>,
    next_seq: u64,
}

impl ErrorLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity),
            next_seq: 1,
        }
    }

    pub fn push(&mut self, report: ErrorReport, now: u64) -> Result<&ClientError, ApiError> {
        if report.message.trim().is_empty() {
            return Err(ApiError::bad_request("message must be a non-empty string"));
        }
        tracing::warn!(
            source = %report.source,
            kind = ?report.kind,
            message = %report.message,
            "client error"
        );

        let entry = ClientError {
            id: format!("{now}-{}", self.next_seq),
            message: report.message,
            stack: report.stack,
            source: report.source,
            timestamp: now,
            kind: report.kind,
        };
        self.next_seq += 1;

        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        // just pushed, cannot be empty
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Oldest first.
    pub fn entries(&self) -> Vec<ClientError> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(message: &str) -> ErrorReport {
        ErrorReport {
            message: message.to_string(),
            stack: None,
            source: "/vitals".to_string(),
            kind: ClientErrorKind::Error,
        }
    }

    #[test]
    fn test_push_assigns_id_and_timestamp() {
        let mut log = ErrorLog::new(10);
        let first = log.push(report("a"), 500).unwrap().clone();
        let second = log.push(report("b"), 500).unwrap().clone();
        assert_eq!(first.timestamp, 500);
        assert_ne!(first.id, second.id);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_oldest_entries_are_dropped() {
        let mut log = ErrorLog::new(100);
        for i in 0..105 {
            log.push(report(&format!("err {i}")), i).unwrap();
        }
        let entries = log.entries();
        assert_eq!(entries.len(), 100);
        assert_eq!(entries[0].message, "err 5");
        assert_eq!(entries[99].message, "err 104");
    }

    #[test]
    fn test_blank_message_rejected() {
        let mut log = ErrorLog::new(3);
        assert!(log.push(report("  "), 0).is_err());
        assert!(log.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut log = ErrorLog::new(3);
        log.push(report("x"), 0).unwrap();
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_report_from_page_payload() {
        let report: ErrorReport = serde_json::from_value(serde_json::json!({
            "message": "video failed",
            "source": "/quad",
            "type": "unhandledrejection"
        }))
        .unwrap();
        assert_eq!(report.kind, ClientErrorKind::UnhandledRejection);
        assert!(report.stack.is_none());
    }
}
