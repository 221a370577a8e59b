//! The task record.
//!
//! A [`Task`] is what observers see of one requested download. Records live in
//! the [`TaskStore`](super::TaskStore) and are only ever handed out as owned
//! copies.

use super::status::TaskStatus;
use serde::Serialize;
use std::path::PathBuf;

/// One requested download.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    /// Opaque identifier generated at enqueue time.
    pub id: String,
    /// Source URL.
    pub url: String,
    /// Lifecycle state.
    pub status: TaskStatus,
    /// Percentage with two decimals, `None` while the total size is unknown.
    pub progress: Option<f64>,
    /// Bytes written to the destination file so far.
    pub downloaded_bytes: u64,
    /// Size announced by the server, 0 when unknown.
    pub total_bytes: u64,
    /// Destination path. Assigned on the first attempt and kept afterwards.
    pub filename: Option<PathBuf>,
    /// Most recent failure.
    pub error: Option<String>,
    /// Failed attempts so far, or the attempts used once completed.
    pub retry_count: u32,
}

impl Task {
    /// Creates a queued record with zeroed counters.
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            status: TaskStatus::Queued,
            progress: Some(0.0),
            downloaded_bytes: 0,
            total_bytes: 0,
            filename: None,
            error: None,
            retry_count: 0,
        }
    }

    /// The total size, if the server announced one.
    pub fn total(&self) -> Option<u64> {
        (self.total_bytes > 0).then_some(self.total_bytes)
    }

    /// Records the byte counter and derives the percentage from it.
    pub(crate) fn set_downloaded(&mut self, downloaded: u64) {
        self.downloaded_bytes = downloaded;
        self.progress = self.total().map(|total| percentage(downloaded, total));
    }
}

/// `downloaded / total * 100`, rounded to two decimals.
pub(crate) fn percentage(downloaded: u64, total: u64) -> f64 {
    (downloaded as f64 / total as f64 * 10_000.0).round() / 100.0
}
