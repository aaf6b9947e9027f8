#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Collaborator-agnostic snapshot interfaces and DTOs.
//!
//! Layout: `model/` (requests, tree nodes, prefixes, results), `service/` (origin and
//! sink traits), `error.rs` (staged snapshot failures and request validation).

pub mod error;
pub mod model;
pub mod service;

pub use error::{BoxError, RequestError, SnapshotError, SnapshotOutcome, SnapshotStage};
pub use model::{
    BASE_PREFIX_ROOT, BasePrefix, NodeKind, ObjectKey, OriginRepo, SnapshotRequest,
    SnapshotResult, TreeListing, TreeNode, normalize_path,
};
pub use service::{BlobFetcher, ObjectSink, TreeReader};
