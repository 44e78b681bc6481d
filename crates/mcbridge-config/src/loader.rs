//! Environment-backed configuration loading.

use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::defaults::{
    DEFAULT_GLOBUS_BASE_URL, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_LOG_LEVEL, DEFAULT_LOOKBACK_DAYS,
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_TASK_LIMIT, ENV_ENDPOINT_ID, ENV_GLOBUS_BASE_URL,
    ENV_GLOBUS_TOKEN, ENV_HTTP_TIMEOUT_SECS, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_LOOKBACK_DAYS,
    ENV_POLL_INTERVAL_SECS, ENV_TASK_LIMIT, MAX_TASK_LIMIT,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::BridgeConfig;

impl BridgeConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a value fails
    /// validation.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps variable names to values.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a value fails
    /// validation.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let endpoint_id = read(ENV_ENDPOINT_ID).ok_or(ConfigError::MissingEnv {
            name: ENV_ENDPOINT_ID,
        })?;
        let globus_token = read(ENV_GLOBUS_TOKEN).ok_or(ConfigError::MissingEnv {
            name: ENV_GLOBUS_TOKEN,
        })?;

        let base_url_raw =
            read(ENV_GLOBUS_BASE_URL).unwrap_or_else(|| DEFAULT_GLOBUS_BASE_URL.to_string());
        let globus_base_url = parse_base_url(&base_url_raw)?;

        let poll_secs = parse_or(
            read(ENV_POLL_INTERVAL_SECS),
            ENV_POLL_INTERVAL_SECS,
            DEFAULT_POLL_INTERVAL_SECS,
        )?;
        ensure_positive(ENV_POLL_INTERVAL_SECS, poll_secs)?;

        let lookback_days = parse_or(
            read(ENV_LOOKBACK_DAYS),
            ENV_LOOKBACK_DAYS,
            DEFAULT_LOOKBACK_DAYS,
        )?;
        ensure_positive(ENV_LOOKBACK_DAYS, u64::from(lookback_days))?;

        let task_limit = parse_or(read(ENV_TASK_LIMIT), ENV_TASK_LIMIT, DEFAULT_TASK_LIMIT)?;
        ensure_positive(ENV_TASK_LIMIT, u64::from(task_limit))?;
        if task_limit > MAX_TASK_LIMIT {
            return Err(ConfigError::invalid(
                ENV_TASK_LIMIT,
                "above_maximum",
                &task_limit.to_string(),
            ));
        }

        let timeout_secs = parse_or(
            read(ENV_HTTP_TIMEOUT_SECS),
            ENV_HTTP_TIMEOUT_SECS,
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;
        ensure_positive(ENV_HTTP_TIMEOUT_SECS, timeout_secs)?;

        Ok(Self {
            endpoint_id,
            globus_token,
            globus_base_url,
            poll_interval: Duration::from_secs(poll_secs),
            lookback_days,
            task_limit,
            http_timeout: Duration::from_secs(timeout_secs),
            log_level: read(ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_format: read(ENV_LOG_FORMAT),
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, field: &'static str, default: T) -> ConfigResult<T> {
    raw.map_or(Ok(default), |value| {
        value
            .parse()
            .map_err(|_| ConfigError::invalid(field, "not_a_number", &value))
    })
}

fn ensure_positive(field: &'static str, value: u64) -> ConfigResult<()> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "zero", "0"));
    }
    Ok(())
}

fn parse_base_url(raw: &str) -> ConfigResult<Url> {
    let url = Url::parse(raw.trim_end_matches('/'))
        .map_err(|_| ConfigError::invalid(ENV_GLOBUS_BASE_URL, "invalid_url", raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            ENV_GLOBUS_BASE_URL,
            "unsupported_scheme",
            raw,
        ));
    }
    Ok(url)
}
