//! Error Handling Module
//!
//! Every dispatched call either produces a payload or fails with exactly one
//! [`RequestError`]. Nothing here is retried or suppressed.
//!
//! # Example
//!
//! ```rust
//! use request_dispatch::error::{ErrorCategory, RequestError};
//!
//! let error = RequestError::status(404, "http://localhost/items");
//! assert_eq!(error.category(), ErrorCategory::Status);
//! assert_eq!(error.status_code(), Some(404));
//! ```

use std::time::Duration;
use thiserror::Error;

/// Errors produced by the dispatch pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Network-level failure reported by the transport.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The dispatch deadline elapsed before the exchange settled.
    #[error("Request cancelled after {after:?}")]
    Cancelled { after: Duration },

    /// A response arrived with a status outside the 2xx range.
    #[error("Request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    /// The response body did not match its declared content type.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A registered interceptor rejected the call.
    #[error("Interceptor error: {0}")]
    Interceptor(String),

    /// Invalid base address, header or other caller-supplied setting.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The outgoing body could not be serialized.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Coarse grouping of [`RequestError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Transport,
    Status,
    Decode,
    Configuration,
}

impl RequestError {
    /// Build a status error for the given response.
    pub fn status(status: u16, url: impl Into<String>) -> Self {
        Self::Status {
            status,
            url: url.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) | Self::Cancelled { .. } | Self::Interceptor(_) => {
                ErrorCategory::Transport
            }
            Self::Status { .. } => ErrorCategory::Status,
            Self::Decode(_) => ErrorCategory::Decode,
            Self::Configuration(_) | Self::Encoding(_) => ErrorCategory::Configuration,
        }
    }

    /// Numeric status for [`RequestError::Status`], `None` otherwise.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for network failures, deadline cancellation and interceptor failures.
    pub fn is_transport(&self) -> bool {
        self.category() == ErrorCategory::Transport
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RequestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_carries_code() {
        let err = RequestError::status(500, "http://api.local/items");
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(err.category(), ErrorCategory::Status);
        assert!(!err.is_transport());
        assert_eq!(
            err.to_string(),
            "Request to http://api.local/items failed with status 500"
        );
    }

    #[test]
    fn cancellation_counts_as_transport_failure() {
        let err = RequestError::Cancelled {
            after: Duration::from_millis(250),
        };
        assert!(err.is_transport());
        assert!(err.is_cancelled());
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn interceptor_failure_is_transport_equivalent() {
        let err = RequestError::Interceptor("token refresh failed".into());
        assert_eq!(err.category(), ErrorCategory::Transport);
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: RequestError = json_err.into();
        assert!(matches!(err, RequestError::Decode(_)));
    }
}
