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

//! HTTP surface for source snapshots.
//!
//! Layout: `http/` (router, handlers, problem responses, request metrics), `models.rs`
//! (wire DTOs), `service.rs` (snapshot service seam), `state.rs` (shared handler state),
//! `error.rs` (server bootstrap failures).

pub mod error;
pub mod http;
pub mod models;
pub mod service;
pub(crate) mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
pub use models::{CreateSnapshotRequest, HealthResponse, ProblemDetails, SnapshotCreatedResponse};
pub use service::SnapshotService;
