//! Snapshot service seam used by the HTTP handlers.

use async_trait::async_trait;
use sourcesnap_core::{SnapshotOutcome, SnapshotRequest, SnapshotResult};

/// Runs one snapshot on behalf of an HTTP caller.
#[async_trait]
pub trait SnapshotService: Send + Sync {
    /// Mirror the requested tree using `origin_token` to read from the origin.
    async fn snapshot(
        &self,
        request: SnapshotRequest,
        origin_token: &str,
    ) -> SnapshotOutcome<SnapshotResult>;

    /// Whether a destination store is configured.
    fn store_configured(&self) -> bool;
}
