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

//! Shared test helpers used across the snapshot suites.
//! Layout: fixtures.rs (sample trees, requests, env lookups), mocks.rs (fake origin and sinks).

pub mod fixtures;
pub mod mocks;
