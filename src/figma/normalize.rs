//! Geometry normalisation.
//!
//! Figma reports node placement only through `absoluteBoundingBox`. For
//! convenience each node also gets `top`/`left`, projected from the box.
//! Values already present are kept, and nodes without a box get nothing.

use crate::figma::model::{FetchResult, Node};

/// Derives `top`/`left` for a node and all of its descendants.
///
/// Idempotent: a second pass finds both fields present and changes nothing.
#[must_use]
pub fn normalize(mut node: Node) -> Node {
    normalize_in_place(&mut node);
    node
}

/// Normalises every root node of a fetch result, preserving order.
#[must_use]
pub fn normalize_result(mut result: FetchResult) -> FetchResult {
    for node in &mut result.nodes {
        normalize_in_place(node);
    }
    result
}

fn normalize_in_place(node: &mut Node) {
    if let Some(bbox) = node.absolute_bounding_box {
        node.top.get_or_insert(bbox.y);
        node.left.get_or_insert(bbox.x);
    }

    for child in &mut node.children {
        normalize_in_place(child);
    }
}
