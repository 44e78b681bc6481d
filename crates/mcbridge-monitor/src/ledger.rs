//! In-memory record of which tasks and routing ids the monitor has seen.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

/// Far enough in the past that every task reported by the service is newer.
#[must_use]
pub fn initial_watermark() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2009, 11, 10)
        .and_then(|day| day.and_hms_opt(23, 0, 0))
        .map(|at| at.and_utc())
        .unwrap_or_default()
}

/// Completion-time watermark plus the set of routing ids already handed off.
///
/// The watermark is never advanced; deduplication relies on the routing-id
/// set alone. Entries are never evicted.
#[derive(Debug, Clone)]
pub struct TaskLedger {
    watermark: DateTime<Utc>,
    handled: HashSet<String>,
}

impl TaskLedger {
    /// Ledger starting at [`initial_watermark`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_watermark(initial_watermark())
    }

    /// Ledger starting at `watermark`.
    #[must_use]
    pub fn with_watermark(watermark: DateTime<Utc>) -> Self {
        Self {
            watermark,
            handled: HashSet::new(),
        }
    }

    /// Tasks must complete strictly after this instant to be considered.
    #[must_use]
    pub const fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    /// Whether a task completed at `completed_at` is past the watermark.
    #[must_use]
    pub fn admits(&self, completed_at: DateTime<Utc>) -> bool {
        completed_at > self.watermark
    }

    /// Whether `routing_id` was already handed off.
    #[must_use]
    pub fn contains(&self, routing_id: &str) -> bool {
        self.handled.contains(routing_id)
    }

    /// Remember `routing_id`; returns `false` if it was already present.
    pub fn record(&mut self, routing_id: impl Into<String>) -> bool {
        self.handled.insert(routing_id.into())
    }

    /// Number of remembered routing ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handled.len()
    }

    /// No routing ids remembered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handled.is_empty()
    }
}

impl Default for TaskLedger {
    fn default() -> Self {
        Self::new()
    }
}
