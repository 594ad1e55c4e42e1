//! The `get_figma_data` tool.
//!
//! Validates arguments, fetches the file or node from Figma, derives
//! `top`/`left` geometry and renders the result as YAML (or JSON).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::OutputFormat;
use crate::error::ToolError;
use crate::figma::{normalize_result, FetchRequest, FetchResult, FigmaApi};
use crate::mcp::registry::ToolHandler;

/// Production tool name.
pub const TOOL_NAME: &str = "get_figma_data";

/// Suffix appended to tool names in development mode.
pub const DEV_SUFFIX: &str = "-dev";

/// Tool description shown to clients.
pub const DESCRIPTION: &str = "Fetch the layout of a Figma file, or of a single node \
     within it. Returns the node tree with ids, names, types, text content and \
     absolute bounding boxes; top/left are derived from the bounding box. \
     Use nodeId (from the node-id URL parameter) to fetch only part of a file, \
     and depth to limit how many levels of children are returned.";

/// Returns the tool name for the given mode.
#[must_use]
pub fn tool_name(dev_mode: bool) -> String {
    if dev_mode {
        format!("{TOOL_NAME}{DEV_SUFFIX}")
    } else {
        TOOL_NAME.to_string()
    }
}

/// JSON Schema of the tool arguments.
#[must_use]
pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "fileKey": {
                "type": "string",
                "description": "Key of the Figma file, found in URLs like figma.com/file/<fileKey>/..."
            },
            "nodeId": {
                "type": "string",
                "description": "Optional: id of the node to fetch, found in URLs as node-id=<nodeId>. \
                                Both 1-2 and 1:2 forms are accepted"
            },
            "depth": {
                "type": "integer",
                "minimum": 1,
                "description": "Optional: how many levels of children to return (default: all)"
            }
        },
        "required": ["fileKey"]
    })
}

/// Validates tool arguments and builds the fetch request.
///
/// # Errors
///
/// Returns [`ToolError::InvalidArgument`] if `fileKey` is missing or empty,
/// or if `nodeId` or `depth` are present but malformed.
pub fn parse_arguments(arguments: &Value) -> Result<FetchRequest, ToolError> {
    let file_key = match arguments.get("fileKey") {
        Some(Value::String(key)) if !key.trim().is_empty() => key.trim(),
        Some(Value::String(_)) => {
            return Err(ToolError::invalid_argument("fileKey must not be empty"))
        }
        Some(_) => return Err(ToolError::invalid_argument("fileKey must be a string")),
        None => return Err(ToolError::invalid_argument("fileKey is required")),
    };

    let mut request = FetchRequest::file(file_key);

    match arguments.get("nodeId") {
        None | Some(Value::Null) => {}
        Some(Value::String(id)) if !id.trim().is_empty() => {
            request = request.with_node(id.trim());
        }
        Some(Value::String(_)) => {
            return Err(ToolError::invalid_argument("nodeId must not be empty"))
        }
        Some(_) => return Err(ToolError::invalid_argument("nodeId must be a string")),
    }

    match arguments.get("depth") {
        None | Some(Value::Null) => {}
        Some(value) => {
            let depth = value
                .as_u64()
                .filter(|d| *d > 0)
                .and_then(|d| u32::try_from(d).ok())
                .ok_or_else(|| ToolError::invalid_argument("depth must be a positive integer"))?;
            request = request.with_depth(depth);
        }
    }

    Ok(request)
}

/// Renders a fetch result as text.
///
/// # Errors
///
/// Returns [`ToolError::Serialize`] if encoding fails.
pub fn render(result: &FetchResult, format: OutputFormat) -> Result<String, ToolError> {
    match format {
        OutputFormat::Yaml => {
            yaml_serde::to_string(result).map_err(|e| ToolError::Serialize(e.to_string()))
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(result).map_err(|e| ToolError::Serialize(e.to_string()))
        }
    }
}

/// Handler for `get_figma_data`.
pub struct GetFigmaData {
    api: Arc<dyn FigmaApi>,
    format: OutputFormat,
}

impl GetFigmaData {
    /// Creates the handler.
    pub fn new(api: Arc<dyn FigmaApi>, format: OutputFormat) -> Self {
        Self { api, format }
    }

    /// Validates, fetches, normalises and renders.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are invalid (before any request is
    /// made), if the Figma request fails, or if rendering fails.
    pub async fn handle(&self, arguments: &Value) -> Result<String, ToolError> {
        let request = parse_arguments(arguments)?;

        let result = self.api.fetch(&request).await?;
        let result = normalize_result(result);

        tracing::debug!(
            file_key = %request.file_key,
            node_id = ?request.node_id,
            roots = result.nodes.len(),
            nodes = result.nodes.iter().map(crate::figma::Node::subtree_len).sum::<usize>(),
            "Fetched Figma data"
        );

        render(&result, self.format)
    }
}

#[async_trait]
impl ToolHandler for GetFigmaData {
    async fn call(&self, arguments: Value) -> Result<String, ToolError> {
        self.handle(&arguments).await
    }
}
