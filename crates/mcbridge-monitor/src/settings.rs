//! Tunables for a task completion monitor.

use std::time::Duration;

use chrono::TimeDelta;

/// Delay between poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Days of completed tasks re-scanned each cycle.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;
/// Page size for the task query.
pub const DEFAULT_TASK_LIMIT: u32 = 1_000;

/// Endpoint and timing configuration for one monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Transfer endpoint whose tasks are watched.
    pub endpoint_id: String,
    /// Delay between poll cycles.
    pub poll_interval: Duration,
    /// Completed-task window requested from the service.
    pub lookback: TimeDelta,
    /// Page size for the task query.
    pub task_limit: u32,
}

impl MonitorSettings {
    /// Defaults for `endpoint_id`.
    #[must_use]
    pub fn new(endpoint_id: impl Into<String>) -> Self {
        Self {
            endpoint_id: endpoint_id.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            lookback: TimeDelta::days(i64::from(DEFAULT_LOOKBACK_DAYS)),
            task_limit: DEFAULT_TASK_LIMIT,
        }
    }

    /// Override the delay between cycles.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Override the lookback window in whole days.
    #[must_use]
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback = TimeDelta::days(i64::from(days));
        self
    }

    /// Override the task query page size.
    #[must_use]
    pub const fn with_task_limit(mut self, task_limit: u32) -> Self {
        self.task_limit = task_limit;
        self
    }
}
