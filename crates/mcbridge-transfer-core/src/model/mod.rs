//! DTOs exchanged with the external transfer service.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A task reported by the transfer service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Service-assigned task identifier.
    pub task_id: String,
    /// Completion timestamp as reported by the service (RFC 3339).
    pub completion_time: String,
}

impl Task {
    /// Convenience constructor used by adapters and fixtures.
    #[must_use]
    pub fn new(task_id: impl Into<String>, completion_time: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            completion_time: completion_time.into(),
        }
    }

    /// Parse the completion timestamp.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the service sent a non RFC 3339 value.
    pub fn completed_at(&self) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(&self.completion_time).map(|at| at.with_timezone(&Utc))
    }
}

/// A single file moved by a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferItem {
    /// Path on the source endpoint.
    pub source_path: String,
    /// Path on the destination endpoint; empty for downloads.
    pub destination_path: String,
}

impl TransferItem {
    /// Downloads leave the staging endpoint and carry no destination path.
    #[must_use]
    pub const fn is_download(&self) -> bool {
        self.destination_path.is_empty()
    }
}

/// Task status values understood by the task-list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task finished successfully.
    Succeeded,
}

impl TaskStatus {
    /// Wire value of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "SUCCEEDED",
        }
    }
}

/// Ordering applied to the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOrder {
    /// Oldest completion first.
    CompletionTimeAsc,
}

impl TaskOrder {
    /// Wire value of the ordering clause.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CompletionTimeAsc => "completion_time ASC",
        }
    }
}

/// Query applied when listing tasks on an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks completed on or after this day.
    pub completed_after: NaiveDate,
    /// Status the tasks must have.
    pub status: TaskStatus,
    /// Result ordering.
    pub order_by: TaskOrder,
    /// Page size cap.
    pub limit: u32,
}

impl TaskFilter {
    /// Succeeded tasks completed within `lookback` of `now`, oldest first.
    #[must_use]
    pub fn recent_succeeded(now: DateTime<Utc>, lookback: TimeDelta, limit: u32) -> Self {
        let since = now.checked_sub_signed(lookback).unwrap_or(now);
        Self {
            completed_after: since.date_naive(),
            status: TaskStatus::Succeeded,
            order_by: TaskOrder::CompletionTimeAsc,
            limit,
        }
    }

    /// Day boundary formatted as `YYYY-MM-DD`.
    #[must_use]
    pub fn completed_after_param(&self) -> String {
        self.completed_after.format("%Y-%m-%d").to_string()
    }
}
