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

//! Application bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (environment loading and server start-up), `service.rs`
//! (engine-backed snapshot service), `error.rs` (bootstrap failures).

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Application-level errors.
pub mod error;
/// Snapshot service backed by the origin client, object sink and engine.
pub mod service;

pub use bootstrap::{build_sink, run_app};
pub use error::{AppError, AppResult};
pub use service::EngineSnapshotService;
