//! Wire DTOs for the snapshot API.

use serde::{Deserialize, Serialize};
use sourcesnap_core::SnapshotResult;

/// Body of `POST /source-snapshots`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateSnapshotRequest {
    /// Project the snapshot belongs to.
    pub project_id: String,
    /// Caller-chosen job number, unique per project.
    pub tmp_id: u64,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch (or other ref) to mirror.
    pub branch: String,
    /// Directory or file inside the repository; empty mirrors the whole tree.
    #[serde(default)]
    pub source_path: String,
}

/// Body of a successful `POST /source-snapshots`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotCreatedResponse {
    /// Destination container.
    pub container: String,
    /// Key prefix every object was written under.
    pub prefix: String,
    /// Number of files written.
    pub file_count: u64,
    /// Location of the prefix inside the store.
    pub url: String,
}

impl From<&SnapshotResult> for SnapshotCreatedResponse {
    fn from(result: &SnapshotResult) -> Self {
        Self {
            container: result.container().to_string(),
            prefix: result.prefix().to_string(),
            file_count: result.file_count(),
            url: result.location().to_string(),
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// Build identifier.
    pub build: String,
    /// Whether snapshots have a destination to write to.
    pub store_configured: bool,
}

/// RFC9457 problem document returned for every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short summary of the problem type.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Occurrence-specific explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Request fields that failed validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_params: Option<Vec<ProblemInvalidParam>>,
}

/// Invalid parameter pointer surfaced alongside a [`ProblemDetails`] payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemInvalidParam {
    /// JSON pointer (or header name) of the offending input.
    pub pointer: String,
    /// Why the input was rejected.
    pub message: String,
}
