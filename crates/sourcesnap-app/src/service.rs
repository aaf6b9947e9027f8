//! Engine-backed snapshot service.
//!
//! # Design
//! - The connection pool and sink are shared; each request binds its own origin
//!   credential and gets a fresh orchestrator.
//! - The destination is checked before a credential is bound, so a missing store is a
//!   configuration failure whatever token accompanies the request.
//! - A credential the origin client refuses is a tree read failure, since nothing can be
//!   listed without it.

use std::sync::Arc;

use async_trait::async_trait;
use sourcesnap_api::SnapshotService;
use sourcesnap_core::{ObjectSink, SnapshotError, SnapshotOutcome, SnapshotRequest, SnapshotResult};
use sourcesnap_engine::{EngineConfig, SnapshotOrchestrator};
use sourcesnap_origin::GithubConnector;
use sourcesnap_telemetry::Metrics;

/// Runs snapshots against the configured origin API and object sink.
#[derive(Clone)]
pub struct EngineSnapshotService {
    connector: GithubConnector,
    sink: Option<Arc<dyn ObjectSink>>,
    engine: EngineConfig,
    metrics: Metrics,
}

impl EngineSnapshotService {
    /// Wire the shared collaborators.
    #[must_use]
    pub fn new(
        connector: GithubConnector,
        sink: Option<Arc<dyn ObjectSink>>,
        engine: EngineConfig,
        metrics: Metrics,
    ) -> Self {
        Self {
            connector,
            sink,
            engine,
            metrics,
        }
    }

    fn orchestrator(&self, origin_token: &str) -> SnapshotOutcome<SnapshotOrchestrator> {
        let sink = self.engine.check_destination(self.sink.as_ref())?;
        let client = Arc::new(self.connector.connect(origin_token).map_err(|err| {
            SnapshotError::tree_read("origin credential was rejected").with_source(err)
        })?);
        Ok(
            SnapshotOrchestrator::new(client.clone(), client, Some(sink), self.engine)
                .with_metrics(self.metrics.clone()),
        )
    }
}

#[async_trait]
impl SnapshotService for EngineSnapshotService {
    async fn snapshot(
        &self,
        request: SnapshotRequest,
        origin_token: &str,
    ) -> SnapshotOutcome<SnapshotResult> {
        let orchestrator = match self.orchestrator(origin_token) {
            Ok(orchestrator) => orchestrator,
            Err(err) => {
                self.metrics.inc_snapshot(err.stage().as_str());
                return Err(err);
            }
        };
        orchestrator.snapshot(&request).await
    }

    fn store_configured(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|sink| !sink.container().trim().is_empty())
    }
}
