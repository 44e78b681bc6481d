//! # Design
//!
//! - Identifiers travel in fields and are echoed in the message.
//! - Box the underlying cause so adapters can surface their own error types.

use std::error::Error;

use thiserror::Error;

/// Boxed cause carried by transfer errors.
pub type BoxedCause = Box<dyn Error + Send + Sync>;

/// Failures raised by transfer services and ingestion pipelines.
#[derive(Debug, Error)]
pub enum TransferError {
    /// A call to the external transfer service failed.
    #[error("transfer service {operation} request failed for {target}")]
    Service {
        /// Operation identifier.
        operation: &'static str,
        /// Endpoint or task the request targeted.
        target: String,
        /// Underlying failure.
        #[source]
        source: BoxedCause,
    },
    /// The ingestion pipeline rejected an upload hand-off.
    #[error("upload hand-off failed for routing id {routing_id}")]
    Handoff {
        /// Routing identifier that was being handed off.
        routing_id: String,
        /// Underlying failure.
        #[source]
        source: BoxedCause,
    },
}

impl TransferError {
    /// Wrap a service-side failure.
    pub fn service(
        operation: &'static str,
        target: impl Into<String>,
        source: impl Into<BoxedCause>,
    ) -> Self {
        Self::Service {
            operation,
            target: target.into(),
            source: source.into(),
        }
    }

    /// Wrap a pipeline-side failure.
    pub fn handoff(routing_id: impl Into<String>, source: impl Into<BoxedCause>) -> Self {
        Self::Handoff {
            routing_id: routing_id.into(),
            source: source.into(),
        }
    }

    /// Operation label used in logs and metrics.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Service { operation, .. } => operation,
            Self::Handoff { .. } => "on_upload_ready",
        }
    }
}

/// Convenience alias for transfer results.
pub type TransferResult<T> = Result<T, TransferError>;
