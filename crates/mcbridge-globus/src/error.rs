//! Error types for the transfer API client.

use thiserror::Error;

/// Failures raised while talking to the transfer API.
#[derive(Debug, Error)]
pub enum GlobusError {
    /// The HTTP client could not be constructed.
    #[error("failed to build transfer API client")]
    Build {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// A request URL could not be derived from the configured base.
    #[error("invalid transfer API url")]
    InvalidUrl {
        /// URL that failed to parse.
        url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// The request never produced a response.
    #[error("transfer API request failed")]
    Http {
        /// Operation identifier.
        operation: &'static str,
        /// Request URL.
        url: String,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The service answered with a non-success status.
    #[error(
        "transfer API {operation} returned status {status}{}",
        problem_detail(.code.as_deref(), .message.as_deref())
    )]
    Status {
        /// Operation identifier.
        operation: &'static str,
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Service error code, when the body carried one.
        code: Option<String>,
        /// Service error message, when the body carried one.
        message: Option<String>,
    },
    /// The response body did not match the expected document shape.
    #[error("transfer API response could not be decoded")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// Request URL.
        url: String,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
}

impl GlobusError {
    /// Operation label for logs.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Build { .. } => "build_client",
            Self::InvalidUrl { .. } => "build_url",
            Self::Http { operation, .. }
            | Self::Status { operation, .. }
            | Self::Decode { operation, .. } => operation,
        }
    }

    /// HTTP status for `Status` errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn problem_detail(code: Option<&str>, message: Option<&str>) -> String {
    match (code, message) {
        (Some(code), Some(message)) => format!(" ({code}: {message})"),
        (Some(detail), None) | (None, Some(detail)) => format!(" ({detail})"),
        (None, None) => String::new(),
    }
}

/// Convenience alias for client results.
pub type GlobusResult<T> = Result<T, GlobusError>;
