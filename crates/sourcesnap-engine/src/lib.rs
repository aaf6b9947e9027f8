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

//! Snapshot engine: walks an origin tree and mirrors every file into an object sink.
//!
//! Layout: `resolver.rs` (origin path to object key), `orchestrator.rs` (work-stack walk
//! with bounded concurrency, fail-fast and deadline handling).

pub mod orchestrator;
pub mod resolver;

pub use orchestrator::{
    DEFAULT_MAX_IN_FLIGHT, EngineConfig, SnapshotOrchestrator, SnapshotPhase,
};
pub use resolver::{PathResolver, ResolveError, resolve_key};
