//! Environment variable names and default values.
//!
//! # Design
//! - Every variable the services read is named here, once.
//! - Defaults stay explicit so deployments can audit them.

use std::time::Duration;

/// Destination container; absence leaves the store unconfigured.
pub const ENV_BUCKET: &str = "SOURCE_BUCKET_NAME";
/// Store backend selector (`filesystem` or `http`).
pub const ENV_STORE_BACKEND: &str = "SOURCESNAP_STORE_BACKEND";
/// Filesystem sink root directory.
pub const ENV_STORE_ROOT: &str = "SOURCESNAP_STORE_ROOT";
/// HTTP sink base URL.
pub const ENV_STORE_ENDPOINT: &str = "SOURCESNAP_STORE_ENDPOINT";
/// HTTP sink bearer token.
pub const ENV_STORE_TOKEN: &str = "SOURCESNAP_STORE_TOKEN";
/// Origin API base URL.
pub const ENV_GITHUB_API_URL: &str = "SOURCESNAP_GITHUB_API_URL";
/// Listing timeout in seconds.
pub const ENV_LIST_TIMEOUT_SECS: &str = "SOURCESNAP_LIST_TIMEOUT_SECS";
/// Blob timeout in seconds.
pub const ENV_BLOB_TIMEOUT_SECS: &str = "SOURCESNAP_BLOB_TIMEOUT_SECS";
/// Transport retries for transient origin failures.
pub const ENV_ORIGIN_MAX_RETRIES: &str = "SOURCESNAP_ORIGIN_MAX_RETRIES";
/// First backoff delay in milliseconds.
pub const ENV_ORIGIN_RETRY_BASE_MS: &str = "SOURCESNAP_ORIGIN_RETRY_BASE_MS";
/// Engine concurrency bound.
pub const ENV_MAX_IN_FLIGHT: &str = "SOURCESNAP_MAX_IN_FLIGHT";
/// Optional per-snapshot deadline in seconds.
pub const ENV_SNAPSHOT_DEADLINE_SECS: &str = "SOURCESNAP_SNAPSHOT_DEADLINE_SECS";
/// API listener address.
pub const ENV_BIND_ADDR: &str = "SOURCESNAP_BIND_ADDR";
/// Log output format (`json` or `pretty`).
pub const ENV_LOG_FORMAT: &str = "SOURCESNAP_LOG_FORMAT";
/// Default log filter when `RUST_LOG` is unset.
pub const ENV_LOG_LEVEL: &str = "SOURCESNAP_LOG_LEVEL";
/// Build identifier recorded in logs and the health payload.
pub const ENV_BUILD_SHA: &str = "SOURCESNAP_BUILD_SHA";

/// Default filesystem sink root.
pub const DEFAULT_STORE_ROOT: &str = "./.sourcesnap-store";
/// Default origin API base.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
/// Default listing timeout.
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(10);
/// Default blob timeout.
pub const DEFAULT_BLOB_TIMEOUT: Duration = Duration::from_secs(30);
/// Default transport retries.
pub const DEFAULT_ORIGIN_MAX_RETRIES: u32 = 2;
/// Default first backoff delay.
pub const DEFAULT_ORIGIN_RETRY_BASE: Duration = Duration::from_millis(250);
/// Default engine concurrency bound.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;
/// Default API listener address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7070";
/// Build identifier used when none is supplied.
pub const DEFAULT_BUILD_SHA: &str = "dev";
