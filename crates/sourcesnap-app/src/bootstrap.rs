//! Application bootstrap.
//!
//! # Design
//! - All dependencies are built from configuration before anything is served.
//! - The boot sequence takes injected dependencies so tests avoid process state.

use std::net::SocketAddr;
use std::sync::Arc;

use sourcesnap_api::{ApiServer, SnapshotService};
use sourcesnap_config::{LogSettings, OriginConfig, SnapshotConfig, StoreBackend, StoreConfig};
use sourcesnap_core::ObjectSink;
use sourcesnap_engine::EngineConfig;
use sourcesnap_origin::{GithubConnector, OriginSettings, RetryPolicy};
use sourcesnap_store::{FilesystemSink, HttpObjectSink};
use sourcesnap_telemetry::Metrics;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::service::EngineSnapshotService;

/// Dependencies required to bootstrap the application.
pub(crate) struct BootstrapDependencies {
    logging: LogSettings,
    bind_addr: SocketAddr,
    service: EngineSnapshotService,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment.
    pub(crate) fn from_env() -> AppResult<Self> {
        let config =
            SnapshotConfig::from_env().map_err(|err| AppError::config("config.from_env", err))?;
        Self::from_config(config)
    }

    pub(crate) fn from_config(config: SnapshotConfig) -> AppResult<Self> {
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        let connector = GithubConnector::new(origin_settings(&config.origin))
            .map_err(|err| AppError::origin("origin.connector", err))?;
        let sink = config.store.as_ref().map(build_sink).transpose()?;
        let engine = EngineConfig {
            max_in_flight: config.engine.max_in_flight,
            deadline: config.engine.deadline,
        };
        Ok(Self {
            logging: config.logging,
            bind_addr: config.server.bind_addr,
            service: EngineSnapshotService::new(connector, sink, engine, telemetry.clone()),
            telemetry,
        })
    }
}

/// Build the object sink a store configuration describes.
///
/// # Errors
///
/// Returns [`AppError::Store`] when the sink rejects its container, root or endpoint.
pub fn build_sink(store: &StoreConfig) -> AppResult<Arc<dyn ObjectSink>> {
    let sink: Arc<dyn ObjectSink> = match &store.backend {
        StoreBackend::Filesystem { root } => Arc::new(
            FilesystemSink::new(root, store.container.clone())
                .map_err(|err| AppError::store("store.filesystem", err))?,
        ),
        StoreBackend::Http { endpoint, token } => Arc::new(
            HttpObjectSink::new(endpoint.clone(), store.container.clone(), token.clone())
                .map_err(|err| AppError::store("store.http", err))?,
        ),
    };
    Ok(sink)
}

fn origin_settings(origin: &OriginConfig) -> OriginSettings {
    OriginSettings {
        api_url: origin.api_url.clone(),
        list_timeout: origin.list_timeout,
        blob_timeout: origin.blob_timeout,
        retry: RetryPolicy {
            max_retries: origin.max_retries,
            base_delay: origin.retry_base_delay,
            ..RetryPolicy::default()
        },
    }
}

/// Entry point for the application boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, dependency construction or serving fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies).await
}

/// Boot sequence that relies entirely on injected dependencies.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    let BootstrapDependencies {
        logging,
        bind_addr,
        service,
        telemetry,
    } = dependencies;
    sourcesnap_telemetry::init_logging(&logging.logging_config())
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;

    info!(build_sha = %logging.build_sha, "sourcesnap bootstrap starting");
    if !service.store_configured() {
        warn!("no destination store configured; snapshots will fail until one is set");
    }

    let api = ApiServer::new(Arc::new(service), telemetry);
    info!(addr = %bind_addr, "Launching API listener");
    api.serve(bind_addr)
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("API server shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use sourcesnap_core::BasePrefix;
    use sourcesnap_test_support::fixtures::env_lookup;
    use tempfile::TempDir;

    #[test]
    fn dependencies_follow_configuration() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path().to_string_lossy().into_owned();
        let config = SnapshotConfig::from_lookup(env_lookup(&[
            ("SOURCE_BUCKET_NAME", "snapshots"),
            ("SOURCESNAP_STORE_ROOT", root.as_str()),
            ("SOURCESNAP_MAX_IN_FLIGHT", "2"),
            ("SOURCESNAP_BIND_ADDR", "127.0.0.1:0"),
        ]))?;

        let dependencies = BootstrapDependencies::from_config(config)?;

        assert_eq!(dependencies.bind_addr.port(), 0);
        assert!(dependencies.service.store_configured());
        Ok(())
    }

    #[test]
    fn build_sink_selects_backend() -> Result<()> {
        let temp = TempDir::new()?;
        let filesystem = build_sink(&StoreConfig {
            container: "bucket".to_string(),
            backend: StoreBackend::Filesystem {
                root: temp.path().to_path_buf(),
            },
        })?;
        assert_eq!(filesystem.container(), "bucket");
        let prefix = BasePrefix::from_segments(&["1"]);
        assert!(filesystem.location(&prefix).starts_with("file://"));

        let http = build_sink(&StoreConfig {
            container: "bucket".to_string(),
            backend: StoreBackend::Http {
                endpoint: url::Url::parse("https://objects.example/")?,
                token: None,
            },
        })?;
        assert_eq!(
            http.location(&prefix),
            "https://objects.example/bucket/user/1"
        );
        Ok(())
    }

    #[test]
    fn origin_settings_carry_retry_tuning() -> Result<()> {
        let config = SnapshotConfig::from_lookup(env_lookup(&[
            ("SOURCESNAP_ORIGIN_MAX_RETRIES", "5"),
            ("SOURCESNAP_ORIGIN_RETRY_BASE_MS", "100"),
            ("SOURCESNAP_LIST_TIMEOUT_SECS", "3"),
        ]))?;
        let settings = origin_settings(&config.origin);
        assert_eq!(settings.retry.max_retries, 5);
        assert_eq!(settings.retry.base_delay.as_millis(), 100);
        assert_eq!(settings.list_timeout.as_secs(), 3);
        assert_eq!(settings.retry.max_delay, RetryPolicy::default().max_delay);
        Ok(())
    }
}
