//! Snapshot orchestration over an explicit work stack.
//!
//! # Design
//! - Pending work lives on a LIFO stack so tree depth never grows the call stack.
//! - At most `max_in_flight` collaborator calls run at once; `1` reproduces a strictly
//!   sequential pre-order walk in listing order.
//! - Only the driver loop touches the file count and the stack.
//! - The first failure wins; dropping the task set aborts everything still running.
//! - Partial output is left in place for an idempotent retry to overwrite.

use std::panic;
use std::sync::Arc;
use std::time::Duration;

use sourcesnap_core::{
    BlobFetcher, NodeKind, ObjectKey, ObjectSink, OriginRepo, SnapshotError, SnapshotOutcome,
    SnapshotRequest, SnapshotResult, TreeListing, TreeReader,
};
use sourcesnap_telemetry::{Metrics, OUTCOME_COMPLETED};
use tokio::task::{JoinError, JoinSet};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::resolver::PathResolver;

/// Concurrency bound used when none is configured.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Tunables for the snapshot walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on concurrent listing/fetch/write tasks. Must be at least 1.
    pub max_in_flight: usize,
    /// Optional wall-clock budget for one snapshot.
    pub deadline: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            deadline: None,
        }
    }
}

impl EngineConfig {
    /// Confirm a snapshot can run against `sink` before any collaborator is contacted.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` [`SnapshotError`] when the sink is missing, its container
    /// is blank, or `max_in_flight` is zero.
    pub fn check_destination(
        &self,
        sink: Option<&Arc<dyn ObjectSink>>,
    ) -> SnapshotOutcome<Arc<dyn ObjectSink>> {
        let Some(sink) = sink else {
            return Err(SnapshotError::configuration(
                "destination store is not configured",
            ));
        };
        if sink.container().trim().is_empty() {
            return Err(SnapshotError::configuration(
                "destination container identifier is empty",
            ));
        }
        if self.max_in_flight == 0 {
            return Err(SnapshotError::configuration(
                "max_in_flight must be at least 1",
            ));
        }
        Ok(Arc::clone(sink))
    }
}

/// Observable phases of a snapshot, used as a structured log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotPhase {
    /// Validating configuration.
    Init,
    /// Listing the traversal root.
    Walking,
    /// Listing a nested directory.
    Descending,
    /// Downloading file content.
    Fetching,
    /// Writing an object.
    Writing,
    /// Terminal success.
    Done,
    /// Terminal failure.
    Failed,
}

impl SnapshotPhase {
    /// Stable identifier used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Walking => "walking",
            Self::Descending => "descending",
            Self::Fetching => "fetching",
            Self::Writing => "writing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug)]
enum WorkItem {
    List(String),
    Copy { path: String, key: ObjectKey },
}

#[derive(Debug)]
enum TaskOutput {
    Listed { path: String, listing: TreeListing },
    Copied { key: ObjectKey, bytes: usize },
}

struct WalkContext {
    origin: OriginRepo,
    git_ref: String,
    root: String,
    tree: Arc<dyn TreeReader>,
    blobs: Arc<dyn BlobFetcher>,
    sink: Arc<dyn ObjectSink>,
}

impl WalkContext {
    async fn execute(self: Arc<Self>, item: WorkItem) -> SnapshotOutcome<TaskOutput> {
        match item {
            WorkItem::List(path) => self.list(path).await,
            WorkItem::Copy { path, key } => self.copy(&path, key).await,
        }
    }

    async fn list(&self, path: String) -> SnapshotOutcome<TaskOutput> {
        let phase = if path == self.root {
            SnapshotPhase::Walking
        } else {
            SnapshotPhase::Descending
        };
        debug!(phase = phase.as_str(), path = %path, "listing origin path");
        let listing = self
            .tree
            .list_children(&self.origin, &path, &self.git_ref)
            .await
            .map_err(|err| {
                SnapshotError::tree_read(format!(
                    "failed to list {}:{path}@{}",
                    self.origin, self.git_ref
                ))
                .with_source(err)
            })?;
        Ok(TaskOutput::Listed { path, listing })
    }

    async fn copy(&self, path: &str, key: ObjectKey) -> SnapshotOutcome<TaskOutput> {
        debug!(phase = SnapshotPhase::Fetching.as_str(), path = %path, "fetching blob");
        let bytes = self
            .blobs
            .fetch_bytes(&self.origin, path, &self.git_ref)
            .await
            .map_err(|err| {
                SnapshotError::blob_fetch(format!(
                    "failed to fetch {}:{path}@{}",
                    self.origin, self.git_ref
                ))
                .with_source(err)
            })?;

        let size = bytes.len();
        debug!(phase = SnapshotPhase::Writing.as_str(), key = %key, bytes = size, "writing object");
        self.sink.write(&key, bytes).await.map_err(|err| {
            SnapshotError::store_write(format!(
                "failed to write {key} into {}",
                self.sink.container()
            ))
            .with_source(err)
        })?;
        Ok(TaskOutput::Copied { key, bytes: size })
    }
}

/// Drives one snapshot from an origin tree into an object sink.
#[derive(Clone)]
pub struct SnapshotOrchestrator {
    tree: Arc<dyn TreeReader>,
    blobs: Arc<dyn BlobFetcher>,
    sink: Option<Arc<dyn ObjectSink>>,
    config: EngineConfig,
    metrics: Option<Metrics>,
}

impl SnapshotOrchestrator {
    /// Wire the collaborators. A missing sink is reported when a snapshot runs.
    #[must_use]
    pub fn new(
        tree: Arc<dyn TreeReader>,
        blobs: Arc<dyn BlobFetcher>,
        sink: Option<Arc<dyn ObjectSink>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            tree,
            blobs,
            sink,
            config,
            metrics: None,
        }
    }

    /// Record snapshot outcomes and written files into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Whether a usable destination sink is wired in.
    #[must_use]
    pub fn store_configured(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|sink| !sink.container().trim().is_empty())
    }

    /// Mirror every file reachable from the request's root into the sink.
    ///
    /// # Errors
    ///
    /// Returns exactly one [`SnapshotError`]: `Configuration` before any network call when
    /// the sink or concurrency bound is unusable, `TreeRead`/`BlobFetch`/`StoreWrite` for
    /// the first collaborator failure, and `Cancelled` when the deadline elapses.
    pub async fn snapshot(&self, request: &SnapshotRequest) -> SnapshotOutcome<SnapshotResult> {
        let span = info_span!(
            "snapshot",
            owner = %request.origin().owner,
            repo = %request.origin().name,
            git_ref = %request.git_ref(),
            root = %request.root_path(),
        );
        let outcome = self.run(request).instrument(span.clone()).await;

        span.in_scope(|| match &outcome {
            Ok(result) => {
                info!(
                    phase = SnapshotPhase::Done.as_str(),
                    container = %result.container(),
                    prefix = %result.prefix(),
                    file_count = result.file_count(),
                    "snapshot completed"
                );
                self.record_outcome(OUTCOME_COMPLETED);
            }
            Err(err) => {
                warn!(
                    phase = SnapshotPhase::Failed.as_str(),
                    stage = err.stage().as_str(),
                    error = %err,
                    "snapshot failed"
                );
                self.record_outcome(err.stage().as_str());
            }
        });
        outcome
    }

    async fn run(&self, request: &SnapshotRequest) -> SnapshotOutcome<SnapshotResult> {
        debug!(phase = SnapshotPhase::Init.as_str(), "validating snapshot configuration");
        let sink = self.validated_sink()?;
        let resolver = PathResolver::new(request.base_prefix(), request.root_path().to_string());
        let context = Arc::new(WalkContext {
            origin: request.origin().clone(),
            git_ref: request.git_ref().to_string(),
            root: request.root_path().to_string(),
            tree: Arc::clone(&self.tree),
            blobs: Arc::clone(&self.blobs),
            sink: Arc::clone(&sink),
        });

        let walk = self.walk(context, &resolver);
        let file_count = match self.config.deadline {
            Some(deadline) => tokio::time::timeout(deadline, walk).await.map_err(|_| {
                SnapshotError::cancelled(format!(
                    "snapshot exceeded its deadline of {}ms",
                    deadline.as_millis()
                ))
            })??,
            None => walk.await?,
        };

        let prefix = resolver.prefix().clone();
        let location = sink.location(&prefix);
        Ok(SnapshotResult::new(
            sink.container(),
            prefix,
            file_count,
            location,
        ))
    }

    fn validated_sink(&self) -> SnapshotOutcome<Arc<dyn ObjectSink>> {
        self.config.check_destination(self.sink.as_ref())
    }

    async fn walk(
        &self,
        context: Arc<WalkContext>,
        resolver: &PathResolver,
    ) -> SnapshotOutcome<u64> {
        let mut pending = vec![WorkItem::List(context.root.clone())];
        let mut tasks: JoinSet<SnapshotOutcome<TaskOutput>> = JoinSet::new();
        let mut file_count: u64 = 0;

        loop {
            while tasks.len() < self.config.max_in_flight {
                let Some(item) = pending.pop() else {
                    break;
                };
                let task = Arc::clone(&context).execute(item).in_current_span();
                tasks.spawn(task);
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            match settle(joined)? {
                TaskOutput::Listed { path, listing } => {
                    let batch = plan_listing(&path, listing, resolver)?;
                    pending.extend(batch.into_iter().rev());
                }
                TaskOutput::Copied { key, bytes } => {
                    file_count += 1;
                    if let Some(metrics) = &self.metrics {
                        metrics.inc_file_written();
                    }
                    debug!(key = %key, bytes, file_count, "object written");
                }
            }
        }

        Ok(file_count)
    }

    fn record_outcome(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_snapshot(outcome);
        }
    }
}

fn settle(
    joined: Result<SnapshotOutcome<TaskOutput>, JoinError>,
) -> SnapshotOutcome<TaskOutput> {
    match joined {
        Ok(outcome) => outcome,
        Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
        Err(err) => Err(SnapshotError::cancelled("snapshot task was cancelled").with_source(err)),
    }
}

/// Classify one listing into follow-up work, preserving listing order.
fn plan_listing(
    current: &str,
    listing: TreeListing,
    resolver: &PathResolver,
) -> SnapshotOutcome<Vec<WorkItem>> {
    let nodes = listing.into_nodes();
    let mut batch = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node.kind {
            NodeKind::Directory if node.path == current => {
                warn!(path = %node.path, "listing echoed its own directory; skipping");
            }
            NodeKind::Directory => batch.push(WorkItem::List(node.path)),
            NodeKind::File => {
                let key = resolver.resolve(&node.path).map_err(|err| {
                    SnapshotError::tree_read(format!(
                        "listing of '{current}' returned '{}' which cannot be mapped to a key",
                        node.path
                    ))
                    .with_source(err)
                })?;
                batch.push(WorkItem::Copy {
                    path: node.path,
                    key,
                });
            }
            NodeKind::Symlink | NodeKind::Submodule | NodeKind::Other(_) => {
                warn!(
                    path = %node.path,
                    kind = node.kind.as_str(),
                    "skipping unsupported node kind"
                );
            }
        }
    }
    Ok(batch)
}
