//! Filesystem-backed object sink.
//!
//! # Design
//! - Objects land at `<root>/<container>/<key>`; keys never escape the container.
//! - Writes go to a temporary sibling and are renamed over the destination, so readers
//!   only ever observe complete objects and rewrites replace in place.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sourcesnap_core::{BasePrefix, BoxError, ObjectKey, ObjectSink};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Sink that stores each object as a file under a bucket directory.
#[derive(Debug, Clone)]
pub struct FilesystemSink {
    container: String,
    container_dir: PathBuf,
}

impl FilesystemSink {
    /// Bind a storage root and container name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] when the container is not a single plain path
    /// segment and [`StoreError::Io`] when the root cannot be made absolute.
    pub fn new(root: impl AsRef<Path>, container: impl Into<String>) -> StoreResult<Self> {
        let container = container.into();
        if !container.is_empty() {
            validate_segment("container", &container, &container)?;
        }
        let root = root.as_ref();
        let root = std::path::absolute(root)
            .map_err(|source| StoreError::io("filesystem.resolve_root", root, source))?;
        Ok(Self {
            container_dir: root.join(&container),
            container,
        })
    }

    /// Directory objects of this container are written under.
    #[must_use]
    pub fn container_dir(&self) -> &Path {
        &self.container_dir
    }

    /// Filesystem path an object key maps to.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] for absolute keys and keys with empty, `.` or
    /// `..` segments.
    pub fn object_path(&self, key: &ObjectKey) -> StoreResult<PathBuf> {
        let raw = key.as_str();
        if raw.is_empty() {
            return Err(StoreError::invalid_key("key", "empty", raw));
        }
        let mut path = self.container_dir.clone();
        for segment in key.segments() {
            validate_segment("key", segment, raw)?;
            path.push(segment);
        }
        Ok(path)
    }

    async fn write_object(&self, key: &ObjectKey, bytes: &[u8]) -> StoreResult<PathBuf> {
        let destination = self.object_path(key)?;
        let (Some(parent), Some(name)) = (destination.parent(), destination.file_name()) else {
            return Err(StoreError::invalid_key("key", "no_file_name", key.as_str()));
        };
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StoreError::io("filesystem.create_parent", parent, source))?;

        let staging = parent.join(format!(
            ".{}.{}.tmp",
            name.to_string_lossy(),
            Uuid::new_v4().simple()
        ));
        if let Err(source) = tokio::fs::write(&staging, bytes).await {
            discard(&staging).await;
            return Err(StoreError::io("filesystem.write_temp", &staging, source));
        }
        if let Err(source) = tokio::fs::rename(&staging, &destination).await {
            discard(&staging).await;
            return Err(StoreError::io("filesystem.rename", &destination, source));
        }
        Ok(destination)
    }
}

fn validate_segment(field: &'static str, segment: &str, value: &str) -> StoreResult<()> {
    let reason = match segment {
        "" => "empty_segment",
        "." => "current_segment",
        ".." => "parent_segment",
        _ if segment.contains(['\\', '\0']) => "invalid_character",
        _ if segment.contains('/') => "nested_segment",
        _ => return Ok(()),
    };
    Err(StoreError::invalid_key(field, reason, value))
}

async fn discard(staging: &Path) {
    if let Err(err) = tokio::fs::remove_file(staging).await {
        warn!(path = %staging.display(), error = %err, "failed to remove staging file");
    }
}

#[async_trait]
impl ObjectSink for FilesystemSink {
    fn container(&self) -> &str {
        &self.container
    }

    fn location(&self, prefix: &BasePrefix) -> String {
        format!("file://{}/{prefix}", self.container_dir.display())
    }

    async fn write(&self, key: &ObjectKey, bytes: Vec<u8>) -> Result<(), BoxError> {
        let path = self.write_object(key, &bytes).await?;
        debug!(key = %key, path = %path.display(), bytes = bytes.len(), "object stored");
        Ok(())
    }
}
