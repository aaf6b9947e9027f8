//! Core snapshot domain types shared across the workspace.
//!
//! # Design
//! - Requests are validated once at construction and immutable afterwards.
//! - The origin's dual listing shape is an explicit tagged union, never an untyped value.
//! - Prefixes and keys are newtypes so they cannot be confused with origin paths.

use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::error::RequestError;

/// Literal namespace every [`BasePrefix`] is rooted under.
pub const BASE_PREFIX_ROOT: &str = "user";

/// Strip every leading and trailing `/` from an origin path.
#[must_use]
pub fn normalize_path(raw: &str) -> String {
    raw.trim_matches('/').to_string()
}

/// Identity of a repository in the origin service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OriginRepo {
    /// Owning user or organisation.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl OriginRepo {
    /// Convenience constructor.
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl Display for OriginRepo {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.owner, self.name)
    }
}

/// Validated, immutable description of one snapshot to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRequest {
    origin: OriginRepo,
    git_ref: String,
    root_path: String,
    identity: Vec<String>,
}

impl SnapshotRequest {
    /// Validate and normalise the inputs of a snapshot.
    ///
    /// `root_path` may be empty to mirror the whole tree; surrounding slashes are stripped.
    /// `identity` segments only feed the destination prefix and must each be non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when owner, repository or ref are blank, when no identity
    /// segment is supplied, or when a segment is empty.
    pub fn new<I, S>(
        origin: OriginRepo,
        git_ref: impl Into<String>,
        root_path: &str,
        identity: I,
    ) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if origin.owner.trim().is_empty() {
            return Err(RequestError::MissingField { field: "owner" });
        }
        if origin.name.trim().is_empty() {
            return Err(RequestError::MissingField { field: "repo" });
        }
        let git_ref = git_ref.into();
        if git_ref.trim().is_empty() {
            return Err(RequestError::MissingField { field: "ref" });
        }

        let identity: Vec<String> = identity.into_iter().map(Into::into).collect();
        if identity.is_empty() {
            return Err(RequestError::MissingField { field: "identity" });
        }
        if identity.iter().any(String::is_empty) {
            return Err(RequestError::InvalidField {
                field: "identity",
                reason: "empty_segment",
                value: Some(identity.join(",")),
            });
        }

        Ok(Self {
            origin,
            git_ref,
            root_path: normalize_path(root_path),
            identity,
        })
    }

    /// Repository being mirrored.
    #[must_use]
    pub const fn origin(&self) -> &OriginRepo {
        &self.origin
    }

    /// Branch name or commit identifier pinning the tree.
    #[must_use]
    pub fn git_ref(&self) -> &str {
        &self.git_ref
    }

    /// Normalised traversal root; empty mirrors the whole tree.
    #[must_use]
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Opaque identity segments the destination prefix is built from.
    #[must_use]
    pub fn identity(&self) -> &[String] {
        &self.identity
    }

    /// Destination prefix derived from the identity segments.
    #[must_use]
    pub fn base_prefix(&self) -> BasePrefix {
        BasePrefix::from_segments(&self.identity)
    }
}

/// Kind of a node returned by a tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Regular file with byte content.
    File,
    /// Directory containing further nodes.
    Directory,
    /// Symbolic link; not reproducible as a flat object.
    Symlink,
    /// Nested repository reference; not reproducible as a flat object.
    Submodule,
    /// Any kind the origin reports that is not understood.
    Other(String),
}

impl NodeKind {
    /// Map the origin's `type` string onto a node kind.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "file" => Self::File,
            "dir" => Self::Directory,
            "symlink" => Self::Symlink,
            "submodule" => Self::Submodule,
            other => Self::Other(other.to_string()),
        }
    }

    /// Label used in logs.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::File => "file",
            Self::Directory => "dir",
            Self::Symlink => "symlink",
            Self::Submodule => "submodule",
            Self::Other(raw) => raw,
        }
    }
}

/// One entry of a tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeNode {
    /// Kind reported by the origin.
    pub kind: NodeKind,
    /// Origin-relative, slash-separated path.
    pub path: String,
}

impl TreeNode {
    /// Construct a node of any kind.
    #[must_use]
    pub fn new(kind: NodeKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Construct a file node.
    #[must_use]
    pub fn file(path: impl Into<String>) -> Self {
        Self::new(NodeKind::File, path)
    }

    /// Construct a directory node.
    #[must_use]
    pub fn directory(path: impl Into<String>) -> Self {
        Self::new(NodeKind::Directory, path)
    }

    /// Final path component.
    #[must_use]
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Result of listing one path in the origin tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeListing {
    /// The queried path names a single node (usually a file).
    Single(TreeNode),
    /// The queried path is a directory; entries are its direct children in origin order.
    Children(Vec<TreeNode>),
}

impl TreeListing {
    /// Flatten into the nodes to classify, preserving origin order.
    #[must_use]
    pub fn into_nodes(self) -> Vec<TreeNode> {
        match self {
            Self::Single(node) => vec![node],
            Self::Children(nodes) => nodes,
        }
    }

    /// Number of nodes carried by the listing.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Children(nodes) => nodes.len(),
        }
    }

    /// Whether the listing carries no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Deterministic destination prefix for one caller/job identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BasePrefix(String);

impl BasePrefix {
    /// Percent-encode each segment and join them under [`BASE_PREFIX_ROOT`].
    ///
    /// Only unreserved characters survive encoding, so a `/` inside a segment can never
    /// be mistaken for a separator. Segments made only of dots are encoded as `%2E` runs
    /// so they never read as `.` or `..` path steps.
    #[must_use]
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        let mut prefix = String::from(BASE_PREFIX_ROOT);
        for segment in segments {
            prefix.push('/');
            prefix.push_str(&encode_segment(segment.as_ref()));
        }
        Self(prefix)
    }

    /// Borrow the prefix as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn encode_segment(segment: &str) -> Cow<'_, str> {
    if !segment.is_empty() && segment.bytes().all(|byte| byte == b'.') {
        return Cow::Owned("%2E".repeat(segment.len()));
    }
    urlencoding::encode(segment)
}

impl Display for BasePrefix {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Flat object-store key of one mirrored file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Join a prefix and a prefix-relative path.
    #[must_use]
    pub fn join(prefix: &BasePrefix, relative: &str) -> Self {
        Self(format!("{prefix}/{relative}"))
    }

    /// Borrow the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the `/`-separated key segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl Display for ObjectKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Outcome of a successful snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotResult {
    container: String,
    prefix: BasePrefix,
    file_count: u64,
    location: String,
}

impl SnapshotResult {
    /// Assemble the result once the walk completed.
    #[must_use]
    pub fn new(
        container: impl Into<String>,
        prefix: BasePrefix,
        file_count: u64,
        location: impl Into<String>,
    ) -> Self {
        Self {
            container: container.into(),
            prefix,
            file_count,
            location: location.into(),
        }
    }

    /// Destination container (bucket) identifier.
    #[must_use]
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Prefix every written key starts with.
    #[must_use]
    pub const fn prefix(&self) -> &BasePrefix {
        &self.prefix
    }

    /// Number of files written.
    #[must_use]
    pub const fn file_count(&self) -> u64 {
        self.file_count
    }

    /// Human-readable URL of the written prefix.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }
}
