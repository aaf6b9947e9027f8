//! Mapping from origin-relative paths to destination object keys.
//!
//! # Design
//! - Pure string manipulation; never touches the network.
//! - Nodes that do not sit under the traversal root are reported, never guessed at.

use sourcesnap_core::{BasePrefix, ObjectKey};
use thiserror::Error;

/// Reasons an origin path cannot be mapped to an object key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The node is neither the root itself nor one of its descendants.
    #[error("node path lies outside the traversal root")]
    OutsideRoot {
        /// Normalised traversal root.
        root: String,
        /// Offending node path.
        path: String,
    },
    /// The node path was empty.
    #[error("node path is empty")]
    EmptyPath,
}

/// Compute the object key of `node_path` for a walk rooted at `root_path`.
///
/// - empty root: the node path is used unchanged;
/// - descendant of the root: the `root/` prefix is stripped;
/// - the root itself (a single-file snapshot): only the basename is kept.
///
/// # Errors
///
/// Returns [`ResolveError::OutsideRoot`] when `node_path` is not under `root_path`, and
/// [`ResolveError::EmptyPath`] when `node_path` is empty.
pub fn resolve_key(
    base_prefix: &BasePrefix,
    root_path: &str,
    node_path: &str,
) -> Result<ObjectKey, ResolveError> {
    if node_path.is_empty() {
        return Err(ResolveError::EmptyPath);
    }
    if root_path.is_empty() {
        return Ok(ObjectKey::join(base_prefix, node_path));
    }

    if let Some(remainder) = node_path
        .strip_prefix(root_path)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
    {
        return Ok(ObjectKey::join(base_prefix, remainder));
    }

    if node_path == root_path {
        let basename = node_path.rsplit('/').next().unwrap_or(node_path);
        return Ok(ObjectKey::join(base_prefix, basename));
    }

    Err(ResolveError::OutsideRoot {
        root: root_path.to_string(),
        path: node_path.to_string(),
    })
}

/// [`resolve_key`] bound to one snapshot's prefix and root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    prefix: BasePrefix,
    root: String,
}

impl PathResolver {
    /// Bind a prefix and a normalised traversal root.
    #[must_use]
    pub const fn new(prefix: BasePrefix, root: String) -> Self {
        Self { prefix, root }
    }

    /// Prefix every resolved key starts with.
    #[must_use]
    pub const fn prefix(&self) -> &BasePrefix {
        &self.prefix
    }

    /// Resolve one node path.
    ///
    /// # Errors
    ///
    /// See [`resolve_key`].
    pub fn resolve(&self, node_path: &str) -> Result<ObjectKey, ResolveError> {
        resolve_key(&self.prefix, &self.root, node_path)
    }
}
