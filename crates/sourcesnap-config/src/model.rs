//! Typed settings produced by the environment loader.
//!
//! # Design
//! - Pure data carriers; IO and parsing live in `loader.rs`.
//! - An absent store is a valid configuration: snapshots then fail with a
//!   configuration error instead of the process refusing to start.

use std::fmt::{self, Debug, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use sourcesnap_telemetry::{LogFormat, LoggingConfig};
use url::Url;

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Destination store, when a container is configured.
    pub store: Option<StoreConfig>,
    /// Origin API connection settings.
    pub origin: OriginConfig,
    /// Snapshot engine tuning.
    pub engine: EngineSettings,
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LogSettings,
}

/// Destination container and backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Container (bucket) objects are written into.
    pub container: String,
    /// Backend that performs the writes.
    pub backend: StoreBackend,
}

/// Object store backend selection.
#[derive(Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Bucket directories on local disk.
    Filesystem {
        /// Directory containing one sub-directory per container.
        root: PathBuf,
    },
    /// HTTP object endpoint accepting `PUT` uploads.
    Http {
        /// Endpoint base URL.
        endpoint: Url,
        /// Optional bearer token.
        token: Option<String>,
    },
}

impl StoreBackend {
    /// Stable backend name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Filesystem { .. } => "filesystem",
            Self::Http { .. } => "http",
        }
    }
}

impl Debug for StoreBackend {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filesystem { root } => formatter
                .debug_struct("Filesystem")
                .field("root", root)
                .finish(),
            Self::Http { endpoint, token } => formatter
                .debug_struct("Http")
                .field("endpoint", &endpoint.as_str())
                .field("token", &token.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Origin API connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginConfig {
    /// API base URL.
    pub api_url: Url,
    /// Timeout for one listing request.
    pub list_timeout: Duration,
    /// Timeout for one blob request.
    pub blob_timeout: Duration,
    /// Retries for transient failures.
    pub max_retries: u32,
    /// First backoff delay.
    pub retry_base_delay: Duration,
}

/// Snapshot engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Upper bound on concurrently running origin/store tasks.
    pub max_in_flight: usize,
    /// Optional wall-clock limit for one snapshot.
    pub deadline: Option<Duration>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address the API binds to.
    pub bind_addr: SocketAddr,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Build identifier.
    pub build_sha: String,
}

impl LogSettings {
    /// Borrow these settings as a telemetry logging configuration.
    #[must_use]
    pub fn logging_config(&self) -> LoggingConfig<'_> {
        LoggingConfig {
            level: &self.level,
            format: self.format,
            build_sha: &self.build_sha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_backend_debug_redacts_token() -> Result<(), url::ParseError> {
        let backend = StoreBackend::Http {
            endpoint: Url::parse("https://objects.example/")?,
            token: Some("s3cr3t".to_string()),
        };
        let rendered = format!("{backend:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("s3cr3t"));
        assert_eq!(backend.kind(), "http");
        Ok(())
    }

    #[test]
    fn log_settings_borrow_into_logging_config() {
        let settings = LogSettings {
            level: "debug".to_string(),
            format: LogFormat::Json,
            build_sha: "abc".to_string(),
        };
        let config = settings.logging_config();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.build_sha, "abc");
    }
}
