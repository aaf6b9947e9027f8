//! Error type and collaborator construction shared by CLI commands.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use anyhow::anyhow;
use sourcesnap_app::{EngineSnapshotService, build_sink};
use sourcesnap_config::{StoreBackend, StoreConfig};
use sourcesnap_core::RequestError;
use sourcesnap_engine::EngineConfig;
use sourcesnap_origin::{GithubConnector, OriginSettings};
use sourcesnap_telemetry::Metrics;

use crate::cli::SnapshotArgs;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<RequestError> for CliError {
    fn from(err: RequestError) -> Self {
        let value = match &err {
            RequestError::InvalidField {
                value: Some(value), ..
            } => format!(" ({value})"),
            _ => String::new(),
        };
        Self::validation(format!("{err}: {}{value}", err.field()))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::failure(anyhow!("failed to format JSON: {err}"))
    }
}

/// Store configuration described by the snapshot flags.
pub(crate) fn store_config(args: &SnapshotArgs) -> CliResult<StoreConfig> {
    let backend = match (&args.store_root, &args.store_endpoint) {
        (Some(root), None) => StoreBackend::Filesystem { root: root.clone() },
        (None, Some(endpoint)) => StoreBackend::Http {
            endpoint: endpoint.clone(),
            token: args.store_token.clone(),
        },
        _ => {
            return Err(CliError::validation(
                "exactly one of --store-root or --store-endpoint is required",
            ));
        }
    };
    Ok(StoreConfig {
        container: args.container.trim().to_string(),
        backend,
    })
}

/// Wire the origin client, object sink and engine for one invocation.
pub(crate) fn snapshot_service(args: &SnapshotArgs) -> CliResult<EngineSnapshotService> {
    let connector = GithubConnector::new(OriginSettings::new(args.api_url.clone()))
        .map_err(|err| CliError::failure(anyhow!(err).context("failed to build origin client")))?;
    let store = store_config(args)?;
    let sink = build_sink(&store)
        .map_err(|err| CliError::validation(format!("{:#}", anyhow!(err))))?;
    let metrics = Metrics::new()
        .map_err(|err| CliError::failure(anyhow!(err).context("failed to build metrics")))?;
    let engine = EngineConfig {
        max_in_flight: args.max_in_flight,
        deadline: args.deadline_secs.map(Duration::from_secs),
    };
    Ok(EngineSnapshotService::new(
        connector,
        Some(sink),
        engine,
        metrics,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(CliError::validation("bad").exit_code(), 2);
        assert_eq!(CliError::failure(anyhow!("boom")).exit_code(), 3);
        assert_eq!(
            CliError::failure(anyhow!("inner").context("outer")).display_message(),
            "outer: inner"
        );
    }

    #[test]
    fn request_errors_name_the_field() {
        let err = CliError::from(RequestError::MissingField { field: "owner" });
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().ends_with(": owner"));
    }
}
