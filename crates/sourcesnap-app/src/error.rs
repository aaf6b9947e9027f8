//! # Design
//!
//! - Centralize application-level errors for bootstrap and serving.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

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
        source: sourcesnap_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: sourcesnap_telemetry::TelemetryError,
    },
    /// Origin client construction failed.
    #[error("origin client operation failed")]
    Origin {
        /// Operation identifier.
        operation: &'static str,
        /// Source origin error.
        source: sourcesnap_origin::OriginError,
    },
    /// Object sink construction failed.
    #[error("object store operation failed")]
    Store {
        /// Operation identifier.
        operation: &'static str,
        /// Source store error.
        source: sourcesnap_store::StoreError,
    },
    /// API server operations failed.
    #[error("api server operation failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source API server error.
        source: sourcesnap_api::ApiServerError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: sourcesnap_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: sourcesnap_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn origin(
        operation: &'static str,
        source: sourcesnap_origin::OriginError,
    ) -> Self {
        Self::Origin { operation, source }
    }

    pub(crate) const fn store(operation: &'static str, source: sourcesnap_store::StoreError) -> Self {
        Self::Store { operation, source }
    }

    pub(crate) const fn api_server(
        operation: &'static str,
        source: sourcesnap_api::ApiServerError,
    ) -> Self {
        Self::ApiServer { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn app_error_helpers_build_variants() {
        let config = AppError::config(
            "config.load",
            sourcesnap_config::ConfigError::InvalidField {
                field: "SOURCESNAP_MAX_IN_FLIGHT",
                reason: "must_be_positive",
                value: Some("0".to_string()),
            },
        );
        assert!(matches!(config, AppError::Config { .. }));
        assert_eq!(config.to_string(), "configuration operation failed");
        assert!(config.source().is_some());

        let origin = AppError::origin(
            "origin.connector",
            sourcesnap_origin::OriginError::MissingCredential,
        );
        assert!(matches!(origin, AppError::Origin { .. }));

        let store = AppError::store(
            "store.filesystem",
            sourcesnap_store::StoreError::InvalidEndpoint {
                value: "mailto:x".to_string(),
                reason: "cannot_be_a_base",
            },
        );
        assert!(matches!(store, AppError::Store { .. }));

        let api = AppError::api_server(
            "api_server.serve",
            sourcesnap_api::ApiServerError::Serve {
                source: io::Error::other("io"),
            },
        );
        assert!(matches!(api, AppError::ApiServer { .. }));
    }
}
