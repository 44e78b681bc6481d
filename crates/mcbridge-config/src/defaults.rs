//! Default values and environment variable names.
//!
//! # Design
//! - Centralize defaults so the loader and its tests agree on them.

/// Transfer endpoint whose tasks are monitored.
pub(crate) const ENV_ENDPOINT_ID: &str = "MCBRIDGE_ENDPOINT_ID";
/// Bearer token presented to the transfer API.
pub(crate) const ENV_GLOBUS_TOKEN: &str = "MCBRIDGE_GLOBUS_TOKEN";
/// Base URL of the transfer API.
pub(crate) const ENV_GLOBUS_BASE_URL: &str = "MCBRIDGE_GLOBUS_BASE_URL";
/// Seconds between poll cycles.
pub(crate) const ENV_POLL_INTERVAL_SECS: &str = "MCBRIDGE_POLL_INTERVAL_SECS";
/// Days of completed tasks re-scanned each cycle.
pub(crate) const ENV_LOOKBACK_DAYS: &str = "MCBRIDGE_LOOKBACK_DAYS";
/// Page size for the task query.
pub(crate) const ENV_TASK_LIMIT: &str = "MCBRIDGE_TASK_LIMIT";
/// HTTP request timeout in seconds.
pub(crate) const ENV_HTTP_TIMEOUT_SECS: &str = "MCBRIDGE_HTTP_TIMEOUT_SECS";
/// Log level used when `RUST_LOG` is unset.
pub(crate) const ENV_LOG_LEVEL: &str = "MCBRIDGE_LOG_LEVEL";
/// `json` or `pretty`.
pub(crate) const ENV_LOG_FORMAT: &str = "MCBRIDGE_LOG_FORMAT";

pub(crate) const DEFAULT_GLOBUS_BASE_URL: &str = "https://transfer.api.globusonline.org/v0.10";
pub(crate) const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub(crate) const DEFAULT_LOOKBACK_DAYS: u32 = 7;
pub(crate) const DEFAULT_TASK_LIMIT: u32 = 1_000;
/// The transfer API refuses task-list pages above this size.
pub(crate) const MAX_TASK_LIMIT: u32 = 1_000;
pub(crate) const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_LOG_LEVEL: &str = "info";
