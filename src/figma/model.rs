//! Figma data types.
//!
//! Only the parts of Figma's node schema needed for layout inspection are
//! modelled. Fields Figma sends beyond these are ignored during decoding.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A request for Figma file data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Key of the Figma file (the segment after `/file/` or `/design/` in a URL).
    pub file_key: String,
    /// Optional node to scope the fetch to, in API form (`1:2`).
    pub node_id: Option<String>,
    /// How many levels of children to return.
    pub depth: Option<u32>,
}

impl FetchRequest {
    /// Creates a request for a whole file.
    pub fn file(file_key: impl Into<String>) -> Self {
        Self {
            file_key: file_key.into(),
            node_id: None,
            depth: None,
        }
    }

    /// Scopes the request to a single node.
    ///
    /// Node ids copied from Figma URLs use `-` as separator (`1-2`); the API
    /// expects `:` (`1:2`). Both forms are accepted.
    #[must_use]
    pub fn with_node(mut self, node_id: &str) -> Self {
        self.node_id = Some(node_id.replace('-', ":"));
        self
    }

    /// Limits the depth of the returned tree.
    #[must_use]
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }
}

/// Absolute pixel-space rectangle of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// A Figma document node.
///
/// Decoding is bounded by `serde_json`'s recursion limit of 128. Each layer
/// of the tree uses two levels (the node object and its `children` array),
/// so responses nested deeper than about 60 layers fail to decode and
/// surface as `FigmaError::Decode`. Pass `depth` to fetch very deep files
/// in slices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node id (`1:2`).
    pub id: String,
    /// Layer name.
    #[serde(default)]
    pub name: String,
    /// Node type (`DOCUMENT`, `CANVAS`, `FRAME`, `TEXT`, ...).
    #[serde(rename = "type")]
    pub node_type: String,
    /// Visibility. Figma omits this when the node is visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    /// Text content of `TEXT` nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    /// Absolute bounding box. Absent on documents and pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_bounding_box: Option<BoundingBox>,
    /// Top edge, derived from the bounding box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    /// Left edge, derived from the bounding box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    /// Child nodes in Figma's traversal order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Creates a node with no geometry and no children.
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            visible: None,
            characters: None,
            absolute_bounding_box: None,
            top: None,
            left: None,
            children: Vec::new(),
        }
    }

    /// Sets the absolute bounding box.
    #[must_use]
    pub fn with_bounding_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.absolute_bounding_box = Some(BoundingBox {
            x,
            y,
            width,
            height,
        });
        self
    }

    /// Appends a child node.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Returns the total number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_len).sum::<usize>()
    }
}

/// Data returned by the `get_figma_data` tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    /// File name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Last modification timestamp (ISO 8601, as sent by Figma).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    /// URL of the file thumbnail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Requested root nodes. Index 0 is the requested node or the document.
    pub nodes: Vec<Node>,
}

/// Response body of `GET /v1/files/{key}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub document: Node,
}

/// Response body of `GET /v1/files/{key}/nodes`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NodesResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Figma sends `null` for ids that do not resolve.
    pub nodes: HashMap<String, Option<NodeEntry>>,
}

/// One entry of the `nodes` map.
#[derive(Debug, Deserialize)]
pub(crate) struct NodeEntry {
    pub document: Node,
}

/// Error body returned by Figma on failure.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub err: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.err.or(self.message)
    }
}

impl From<FileResponse> for FetchResult {
    fn from(response: FileResponse) -> Self {
        Self {
            name: response.name,
            last_modified: response.last_modified,
            thumbnail_url: response.thumbnail_url,
            nodes: vec![response.document],
        }
    }
}
