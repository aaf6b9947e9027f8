//! Collaborator traits the snapshot engine is driven through.
//!
//! Implementations report failures as [`BoxError`]; the engine decides which
//! [`crate::SnapshotStage`] they belong to.

use async_trait::async_trait;

use crate::error::BoxError;
use crate::model::{BasePrefix, ObjectKey, OriginRepo, TreeListing};

/// Lists one path of an origin tree at a fixed ref.
#[async_trait]
pub trait TreeReader: Send + Sync {
    /// List `path` (empty for the repository root) at `git_ref`.
    async fn list_children(
        &self,
        origin: &OriginRepo,
        path: &str,
        git_ref: &str,
    ) -> Result<TreeListing, BoxError>;
}

/// Downloads the raw bytes of one file from the origin.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    /// Fetch the exact bytes of the file at `path` and `git_ref`.
    async fn fetch_bytes(
        &self,
        origin: &OriginRepo,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<u8>, BoxError>;
}

/// Destination store the snapshot writes flat objects into.
#[async_trait]
pub trait ObjectSink: Send + Sync {
    /// Identifier of the container (bucket) objects land in. Empty means unconfigured.
    fn container(&self) -> &str;

    /// Human-readable URL of the given prefix inside the container.
    fn location(&self, prefix: &BasePrefix) -> String;

    /// Write `bytes` under `key`, replacing any existing object.
    async fn write(&self, key: &ObjectKey, bytes: Vec<u8>) -> Result<(), BoxError>;
}
