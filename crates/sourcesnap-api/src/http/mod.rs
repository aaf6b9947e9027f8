//! HTTP surface modules (router, handlers, problem responses).

/// Shared constants and header names.
pub(crate) mod constants;
/// Problem response helpers and error mapping.
pub(crate) mod errors;
/// Health and metrics endpoints.
pub(crate) mod health;
/// Router construction and server host.
pub mod router;
/// Snapshot creation handler.
pub(crate) mod snapshots;
/// Metrics middleware for HTTP requests.
pub(crate) mod telemetry;
