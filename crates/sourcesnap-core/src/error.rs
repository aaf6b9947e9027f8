//! Error types for snapshot operations.
//!
//! # Design
//!
//! - A snapshot fails with exactly one [`SnapshotError`], tagged with the stage that failed.
//! - Collaborators report failures as [`BoxError`]; the orchestrator attaches the stage.
//! - Request validation is separate from snapshot failures and never touches the network.

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use thiserror::Error;

/// Boxed error returned by origin and sink collaborators.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Convenience alias for snapshot results.
pub type SnapshotOutcome<T> = Result<T, SnapshotError>;

/// Pipeline stage a snapshot failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStage {
    /// Destination or engine settings were missing or unusable.
    Configuration,
    /// Listing a directory in the origin tree failed.
    TreeRead,
    /// Downloading file content from the origin failed.
    BlobFetch,
    /// Writing an object into the destination store failed.
    StoreWrite,
    /// The snapshot was abandoned after its deadline elapsed.
    Cancelled,
}

impl SnapshotStage {
    /// Stable identifier used in logs, metrics and API payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::TreeRead => "tree_read",
            Self::BlobFetch => "blob_fetch",
            Self::StoreWrite => "store_write",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for SnapshotStage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Terminal failure of a snapshot operation.
#[derive(Debug, Error)]
#[error("snapshot {stage} failure: {message}")]
pub struct SnapshotError {
    stage: SnapshotStage,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl SnapshotError {
    /// Build an error for the given stage without an underlying cause.
    #[must_use]
    pub fn new(stage: SnapshotStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the collaborator error that triggered this failure.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Missing or unusable destination/engine settings.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(SnapshotStage::Configuration, message)
    }

    /// Origin listing failure.
    #[must_use]
    pub fn tree_read(message: impl Into<String>) -> Self {
        Self::new(SnapshotStage::TreeRead, message)
    }

    /// Origin content failure.
    #[must_use]
    pub fn blob_fetch(message: impl Into<String>) -> Self {
        Self::new(SnapshotStage::BlobFetch, message)
    }

    /// Destination write failure.
    #[must_use]
    pub fn store_write(message: impl Into<String>) -> Self {
        Self::new(SnapshotStage::StoreWrite, message)
    }

    /// Deadline expiry.
    #[must_use]
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(SnapshotStage::Cancelled, message)
    }

    /// Stage the failure is attributed to.
    #[must_use]
    pub const fn stage(&self) -> SnapshotStage {
        self.stage
    }

    /// Human-readable description recorded at the point of failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Downcast the wrapped collaborator error, if it has the requested type.
    #[must_use]
    pub fn cause<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.source.as_deref().and_then(|err| err.downcast_ref::<E>())
    }
}

/// Validation failures raised while constructing a snapshot request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    /// A required field was blank.
    #[error("snapshot request field is required")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },
    /// A field was present but unusable.
    #[error("invalid snapshot request field")]
    InvalidField {
        /// Name of the invalid field.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl RequestError {
    /// Field the validation failure refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field } | Self::InvalidField { field, .. } => field,
        }
    }
}
