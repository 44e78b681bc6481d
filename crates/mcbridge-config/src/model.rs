//! Typed bridge configuration.

use std::fmt;
use std::time::Duration;

use url::Url;

/// Runtime configuration for the bridge binary.
#[derive(Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Transfer endpoint whose tasks are monitored.
    pub endpoint_id: String,
    /// Bearer token presented to the transfer API.
    pub globus_token: String,
    /// Base URL of the transfer API, without a trailing slash.
    pub globus_base_url: Url,
    /// Delay between poll cycles.
    pub poll_interval: Duration,
    /// Days of completed tasks re-scanned each cycle.
    pub lookback_days: u32,
    /// Page size for the task query.
    pub task_limit: u32,
    /// Timeout applied to each HTTP request.
    pub http_timeout: Duration,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Requested log format name, if any.
    pub log_format: Option<String>,
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BridgeConfig")
            .field("endpoint_id", &self.endpoint_id)
            .field("globus_token", &"<redacted>")
            .field("globus_base_url", &self.globus_base_url.as_str())
            .field("poll_interval", &self.poll_interval)
            .field("lookback_days", &self.lookback_days)
            .field("task_limit", &self.task_limit)
            .field("http_timeout", &self.http_timeout)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}
