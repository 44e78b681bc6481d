//! # Design
//!
//! - Centralize application-level errors for bootstrap and shutdown.
//! - Keep error messages constant while carrying context fields for debugging.

use thiserror::Error;
use tokio::task::JoinError;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: mcbridge_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: mcbridge_telemetry::TelemetryError,
    },
    /// The transfer API client could not be built.
    #[error("transfer client operation failed")]
    Globus {
        /// Operation identifier.
        operation: &'static str,
        /// Source client error.
        source: mcbridge_globus::GlobusError,
    },
    /// A background task panicked or was aborted.
    #[error("background task failed")]
    Join {
        /// Operation identifier.
        operation: &'static str,
        /// Source join error.
        source: JoinError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: mcbridge_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: mcbridge_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn globus(
        operation: &'static str,
        source: mcbridge_globus::GlobusError,
    ) -> Self {
        Self::Globus { operation, source }
    }

    pub(crate) const fn join(operation: &'static str, source: JoinError) -> Self {
        Self::Join { operation, source }
    }
}
