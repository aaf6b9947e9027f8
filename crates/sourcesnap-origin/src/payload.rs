//! Decoding of Contents API listing bodies.

use serde::Deserialize;
use serde_json::Value;
use sourcesnap_core::{NodeKind, TreeListing, TreeNode};
use tracing::warn;

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "type")]
    kind: Option<String>,
    path: Option<String>,
}

impl RawEntry {
    fn into_node(self) -> Option<TreeNode> {
        match (self.kind, self.path) {
            (Some(kind), Some(path)) => Some(TreeNode::new(NodeKind::parse(&kind), path)),
            (kind, path) => {
                warn!(?kind, ?path, "dropping listing entry without type or path");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsPayload {
    Many(Vec<RawEntry>),
    One(RawEntry),
    Other(Value),
}

/// Decode a listing body; valid JSON of an unexpected shape yields no children.
pub(crate) fn decode_listing(body: &[u8]) -> Result<TreeListing, serde_json::Error> {
    let listing = match serde_json::from_slice::<ContentsPayload>(body)? {
        ContentsPayload::Many(entries) => TreeListing::Children(
            entries
                .into_iter()
                .filter_map(RawEntry::into_node)
                .collect(),
        ),
        ContentsPayload::One(entry) => entry
            .into_node()
            .map_or_else(|| TreeListing::Children(Vec::new()), TreeListing::Single),
        ContentsPayload::Other(value) => {
            warn!(
                shape = value_shape(&value),
                "unrecognised listing shape; treating as empty directory"
            );
            TreeListing::Children(Vec::new())
        }
    };
    Ok(listing)
}

const fn value_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_becomes_children_in_order() -> Result<(), serde_json::Error> {
        let body = br#"[
            {"type": "file", "path": "src/b.txt", "name": "b.txt", "size": 3},
            {"type": "dir", "path": "src/a"},
            {"type": "symlink", "path": "src/link"},
            {"path": "src/untyped"}
        ]"#;
        assert_eq!(
            decode_listing(body)?,
            TreeListing::Children(vec![
                TreeNode::file("src/b.txt"),
                TreeNode::directory("src/a"),
                TreeNode::new(NodeKind::Symlink, "src/link"),
            ])
        );
        Ok(())
    }

    #[test]
    fn object_becomes_single_node() -> Result<(), serde_json::Error> {
        let body = br#"{"type": "file", "path": "README.md", "content": "aGk="}"#;
        assert_eq!(
            decode_listing(body)?,
            TreeListing::Single(TreeNode::file("README.md"))
        );
        Ok(())
    }

    #[test]
    fn unexpected_shapes_are_empty() -> Result<(), serde_json::Error> {
        assert_eq!(decode_listing(br#""hello""#)?, TreeListing::Children(Vec::new()));
        assert_eq!(decode_listing(b"42")?, TreeListing::Children(Vec::new()));
        assert_eq!(
            decode_listing(br#"{"message": "odd"}"#)?,
            TreeListing::Children(Vec::new())
        );
        Ok(())
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(decode_listing(b"{not json").is_err());
    }
}
