//! Task lifecycle states.

use serde::{Serialize, Serializer};
use std::fmt;

/// Where a task is in its lifecycle.
///
/// `Completed` and `Error` are terminal: once a task reaches either of them
/// its record no longer changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Accepted and waiting for a concurrency slot.
    Queued,
    /// Holding a slot, first attempt not yet transferring.
    Starting,
    /// Body bytes are being written to disk.
    Downloading,
    /// The previous attempt failed; `attempt` counts retries from 1.
    Retrying { attempt: u32, max_retries: u32 },
    /// The whole body is on disk.
    Completed,
    /// Retries were exhausted.
    Error,
}

impl TaskStatus {
    /// Whether the task has reached a state it never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Queued => f.write_str("queued"),
            TaskStatus::Starting => f.write_str("starting"),
            TaskStatus::Downloading => f.write_str("downloading"),
            TaskStatus::Retrying {
                attempt,
                max_retries,
            } => write!(f, "retrying ({}/{})", attempt, max_retries),
            TaskStatus::Completed => f.write_str("completed"),
            TaskStatus::Error => f.write_str("error"),
        }
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
