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

//! Object sink implementations for snapshot output.
//!
//! Layout: `fs.rs` (bucket directory on local disk), `http.rs` (`PUT` object endpoint),
//! `error.rs` (typed store failures).

pub mod error;
pub mod fs;
pub mod http;

pub use error::{StoreError, StoreResult};
pub use fs::FilesystemSink;
pub use http::HttpObjectSink;
