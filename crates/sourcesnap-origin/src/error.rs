//! # Design
//!
//! - Constant-message errors with the request context kept in fields.
//! - HTTP statuses the snapshot caller cares about get their own variant.
//! - Transience is decided here so the retry policy stays status-agnostic.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Result alias for origin operations.
pub type OriginResult<T> = Result<T, OriginError>;

/// Failures raised while talking to the origin API.
#[derive(Debug, Error)]
pub enum OriginError {
    /// No credential was supplied.
    #[error("origin credential is missing")]
    MissingCredential,
    /// The configured API base cannot carry path segments.
    #[error("origin base url is invalid")]
    InvalidBaseUrl {
        /// Configured base URL.
        value: String,
        /// Static reason for the rejection.
        reason: &'static str,
    },
    /// The HTTP client could not be constructed.
    #[error("origin http client could not be built")]
    ClientBuild {
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// Connectivity, timeout or body read failure.
    #[error("origin transport failure")]
    Transport {
        /// Operation that was running.
        operation: &'static str,
        /// Request URL.
        url: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// The origin rejected the credential.
    #[error("origin rejected the credential")]
    Unauthorized {
        /// Operation that was running.
        operation: &'static str,
        /// Request URL.
        url: String,
    },
    /// The requested repository, ref or path does not exist.
    #[error("origin resource not found")]
    NotFound {
        /// Operation that was running.
        operation: &'static str,
        /// Request URL.
        url: String,
    },
    /// The origin throttled the caller.
    #[error("origin rate limit exceeded")]
    RateLimited {
        /// Operation that was running.
        operation: &'static str,
        /// Request URL.
        url: String,
        /// Server-provided wait hint, when present.
        retry_after: Option<Duration>,
    },
    /// Any other non-success status.
    #[error("origin returned an unexpected status")]
    Status {
        /// Operation that was running.
        operation: &'static str,
        /// Request URL.
        url: String,
        /// Status returned by the origin.
        status: StatusCode,
    },
    /// The listing body was not valid JSON.
    #[error("origin response could not be decoded")]
    Decode {
        /// Operation that was running.
        operation: &'static str,
        /// Request URL.
        url: String,
        /// Underlying serde error.
        source: serde_json::Error,
    },
}

impl OriginError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::RateLimited { .. } => true,
            Self::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    /// Server-provided wait hint for throttled requests.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status equivalent of the failure, when one applies.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Self::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: StatusCode) -> OriginError {
        OriginError::Status {
            operation: "list",
            url: "https://api.github.com/repos/o/r/contents".to_string(),
            status: code,
        }
    }

    #[test]
    fn transience_follows_status_class() {
        assert!(status(StatusCode::BAD_GATEWAY).is_transient());
        assert!(!status(StatusCode::UNPROCESSABLE_ENTITY).is_transient());
        assert!(
            OriginError::RateLimited {
                operation: "list",
                url: String::new(),
                retry_after: None,
            }
            .is_transient()
        );
        assert!(
            !OriginError::NotFound {
                operation: "fetch",
                url: String::new(),
            }
            .is_transient()
        );
        assert!(!OriginError::MissingCredential.is_transient());
    }

    #[test]
    fn status_and_retry_hint_are_exposed() {
        let throttled = OriginError::RateLimited {
            operation: "list",
            url: String::new(),
            retry_after: Some(Duration::from_secs(3)),
        };
        assert_eq!(throttled.status(), Some(StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(throttled.retry_after(), Some(Duration::from_secs(3)));
        assert_eq!(throttled.to_string(), "origin rate limit exceeded");

        let unauthorized = OriginError::Unauthorized {
            operation: "list",
            url: String::new(),
        };
        assert_eq!(unauthorized.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(OriginError::MissingCredential.status(), None);
    }
}
