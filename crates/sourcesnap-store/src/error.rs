//! # Design
//!
//! - Provide structured, constant-message errors for object writes.
//! - Capture the operation, path or URL so failures are reproducible in tests.
//! - Preserve source errors without interpolating context into messages.

use std::io;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors produced by object sinks.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO failures while writing to the filesystem.
    #[error("store io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A key or container could not be mapped to a safe location.
    #[error("store rejected object key")]
    InvalidKey {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value.
        value: String,
    },
    /// The HTTP endpoint cannot carry object paths.
    #[error("store endpoint is invalid")]
    InvalidEndpoint {
        /// Configured endpoint.
        value: String,
        /// Static reason for the failure.
        reason: &'static str,
    },
    /// The HTTP client could not be constructed.
    #[error("store http client could not be built")]
    ClientBuild {
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// Connectivity or timeout failure talking to the HTTP endpoint.
    #[error("store transport failure")]
    Transport {
        /// Request URL.
        url: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// The HTTP endpoint answered with a non-success status.
    #[error("store returned an unexpected status")]
    Status {
        /// Request URL.
        url: String,
        /// Returned status.
        status: StatusCode,
    },
}

impl StoreError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_key(field: &'static str, reason: &'static str, value: &str) -> Self {
        Self::InvalidKey {
            field,
            reason,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn helpers_keep_context_out_of_messages() {
        let err = StoreError::io("write.rename", "/tmp/x", io::Error::other("disk full"));
        assert_eq!(err.to_string(), "store io failure");
        assert!(err.source().is_some());

        let err = StoreError::invalid_key("key", "parent_segment", "user/../etc");
        assert_eq!(err.to_string(), "store rejected object key");
        assert!(matches!(
            err,
            StoreError::InvalidKey {
                reason: "parent_segment",
                ..
            }
        ));
    }
}
