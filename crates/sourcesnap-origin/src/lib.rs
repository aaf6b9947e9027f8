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

//! GitHub Contents API adapter implementing the snapshot origin traits.
//!
//! Layout: `client.rs` (connector, per-credential client, trait impls), `payload.rs`
//! (listing decode), `retry.rs` (transport retry policy), `error.rs` (typed failures).

pub mod client;
pub mod error;
mod payload;
pub mod retry;

pub use client::{
    DEFAULT_API_URL, DEFAULT_BLOB_TIMEOUT, DEFAULT_LIST_TIMEOUT, GithubClient, GithubConnector,
    OriginSettings,
};
pub use error::{OriginError, OriginResult};
pub use retry::RetryPolicy;
