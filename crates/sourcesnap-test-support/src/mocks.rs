//! In-memory collaborators for exercising the snapshot engine without a network.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use sourcesnap_core::{
    BasePrefix, BlobFetcher, BoxError, NodeKind, ObjectKey, ObjectSink, OriginRepo, TreeListing,
    TreeNode, TreeReader,
};
use thiserror::Error;

/// Failures produced by the fakes in this module.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FakeError {
    /// The requested path does not exist in the fake tree.
    #[error("fake origin path not found")]
    NotFound {
        /// Path that was requested.
        path: String,
    },
    /// A failure was injected for this path.
    #[error("fake origin failure injected")]
    Injected {
        /// Operation that failed (`list` or `fetch`).
        operation: &'static str,
        /// Path the failure was injected for.
        path: String,
    },
    /// The fake sink was told to reject this key.
    #[error("fake sink write rejected")]
    WriteRejected {
        /// Key that was rejected.
        key: String,
    },
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// Fake origin tree serving both listings and blobs from memory.
///
/// Directories are implied by file paths. Listings are returned in lexical order.
#[derive(Debug, Default)]
pub struct FakeOrigin {
    files: BTreeMap<String, Vec<u8>>,
    extra: Vec<(String, TreeNode)>,
    echo_self: bool,
    fail_listing: BTreeSet<String>,
    fail_blob: BTreeSet<String>,
    latency: Option<Duration>,
    list_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    listed: Mutex<Vec<String>>,
    fetched: Mutex<Vec<String>>,
}

impl FakeOrigin {
    /// Empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (and, implicitly, its ancestor directories).
    #[must_use]
    pub fn with_file(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.to_string(), bytes.into());
        self
    }

    /// Add a node of any kind to the listing of its parent directory.
    #[must_use]
    pub fn with_node(mut self, node: TreeNode) -> Self {
        let parent = parent_of(&node.path).to_string();
        self.extra.push((parent, node));
        self
    }

    /// Add a node to the listing of `listed_dir` regardless of its own path.
    #[must_use]
    pub fn with_stray(mut self, listed_dir: &str, node: TreeNode) -> Self {
        self.extra.push((listed_dir.to_string(), node));
        self
    }

    /// Make every non-root directory listing include the directory itself.
    #[must_use]
    pub const fn echoing_self(mut self) -> Self {
        self.echo_self = true;
        self
    }

    /// Fail any listing of `path`.
    #[must_use]
    pub fn failing_listing(mut self, path: &str) -> Self {
        self.fail_listing.insert(path.to_string());
        self
    }

    /// Fail any content fetch of `path`.
    #[must_use]
    pub fn failing_blob(mut self, path: &str) -> Self {
        self.fail_blob.insert(path.to_string());
        self
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of listing calls served.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of fetch calls served.
    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Listing plus fetch calls.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.list_calls() + self.fetch_calls()
    }

    /// Highest number of calls observed running at the same time.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Paths listed, in call order.
    #[must_use]
    pub fn listed_paths(&self) -> Vec<String> {
        lock(&self.listed).clone()
    }

    /// Paths fetched, in call order.
    #[must_use]
    pub fn fetched_paths(&self) -> Vec<String> {
        lock(&self.fetched).clone()
    }

    fn directories(&self) -> BTreeSet<String> {
        let mut dirs = BTreeSet::new();
        let file_paths = self.files.keys().map(String::as_str);
        let extra_dirs = self
            .extra
            .iter()
            .filter(|(_, node)| node.kind == NodeKind::Directory)
            .map(|(_, node)| node.path.as_str());
        for path in file_paths.chain(extra_dirs) {
            let mut current = parent_of(path);
            while !current.is_empty() {
                dirs.insert(current.to_string());
                current = parent_of(current);
            }
        }
        for (_, node) in &self.extra {
            if node.kind == NodeKind::Directory {
                dirs.insert(node.path.clone());
            }
        }
        dirs
    }

    fn listing(&self, path: &str) -> Result<TreeListing, FakeError> {
        if self.fail_listing.contains(path) {
            return Err(FakeError::Injected {
                operation: "list",
                path: path.to_string(),
            });
        }
        if self.files.contains_key(path) {
            return Ok(TreeListing::Single(TreeNode::file(path)));
        }

        let dirs = self.directories();
        if !path.is_empty() && !dirs.contains(path) {
            return Err(FakeError::NotFound {
                path: path.to_string(),
            });
        }

        let mut children: BTreeMap<String, NodeKind> = BTreeMap::new();
        for dir in dirs.iter().filter(|dir| parent_of(dir) == path) {
            children.insert(dir.clone(), NodeKind::Directory);
        }
        for file in self.files.keys().filter(|file| parent_of(file) == path) {
            children.insert(file.clone(), NodeKind::File);
        }
        for (listed_dir, node) in &self.extra {
            if listed_dir == path {
                children.insert(node.path.clone(), node.kind.clone());
            }
        }

        let mut nodes = Vec::with_capacity(children.len() + 1);
        if self.echo_self && !path.is_empty() {
            nodes.push(TreeNode::directory(path));
        }
        nodes.extend(
            children
                .into_iter()
                .map(|(child, kind)| TreeNode::new(kind, child)),
        );
        Ok(TreeListing::Children(nodes))
    }

    async fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(self);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        guard
    }
}

struct InFlight<'a>(&'a FakeOrigin);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TreeReader for FakeOrigin {
    async fn list_children(
        &self,
        _origin: &OriginRepo,
        path: &str,
        _git_ref: &str,
    ) -> Result<TreeListing, BoxError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.listed).push(path.to_string());
        let _guard = self.enter().await;
        Ok(self.listing(path)?)
    }
}

#[async_trait]
impl BlobFetcher for FakeOrigin {
    async fn fetch_bytes(
        &self,
        _origin: &OriginRepo,
        path: &str,
        _git_ref: &str,
    ) -> Result<Vec<u8>, BoxError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.fetched).push(path.to_string());
        let _guard = self.enter().await;
        if self.fail_blob.contains(path) {
            return Err(FakeError::Injected {
                operation: "fetch",
                path: path.to_string(),
            }
            .into());
        }
        self.files.get(path).cloned().ok_or_else(|| {
            FakeError::NotFound {
                path: path.to_string(),
            }
            .into()
        })
    }
}

/// Object sink that keeps every write in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    container: String,
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    rejected: BTreeSet<String>,
    write_calls: AtomicUsize,
}

impl MemorySink {
    /// Empty sink for `container`.
    #[must_use]
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            ..Self::default()
        }
    }

    /// Reject any write to `key`.
    #[must_use]
    pub fn rejecting(mut self, key: &str) -> Self {
        self.rejected.insert(key.to_string());
        self
    }

    /// Snapshot of the stored objects keyed by object key.
    #[must_use]
    pub fn objects(&self) -> BTreeMap<String, Vec<u8>> {
        lock(&self.objects).clone()
    }

    /// Stored keys in lexical order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        lock(&self.objects).keys().cloned().collect()
    }

    /// Bytes stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.objects).get(key).cloned()
    }

    /// Number of write attempts, including rejected ones.
    #[must_use]
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectSink for MemorySink {
    fn container(&self) -> &str {
        &self.container
    }

    fn location(&self, prefix: &BasePrefix) -> String {
        format!("memory://{}/{prefix}", self.container)
    }

    async fn write(&self, key: &ObjectKey, bytes: Vec<u8>) -> Result<(), BoxError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.rejected.contains(key.as_str()) {
            return Err(FakeError::WriteRejected {
                key: key.to_string(),
            }
            .into());
        }
        lock(&self.objects).insert(key.to_string(), bytes);
        Ok(())
    }
}
