//! Tool registry.
//!
//! Maps tool names to handlers and produces the `tools/list` and
//! `tools/call` payloads. Handler failures are turned into error results
//! (`isError: true`) so that they reach the client as tool output rather
//! than as protocol errors.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

/// A callable tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Runs the tool and returns its text output.
    async fn call(&self, arguments: Value) -> Result<String, ToolError>;
}

/// A tool definition for the tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Parameters for a tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Returns the text of the first content item.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|ToolContent::Text { text }| text.as_str())
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)] // skip_serializing_if passes &T
const fn is_false(b: &bool) -> bool {
    !*b
}

struct RegisteredTool {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

/// Named tools, listed in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, replacing any tool already registered under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: impl ToolHandler + 'static,
    ) {
        let definition = ToolDefinition {
            name: name.into(),
            description: Some(description.into()),
            input_schema,
        };
        let tool = RegisteredTool {
            definition,
            handler: Arc::new(handler),
        };

        match self
            .tools
            .iter_mut()
            .find(|t| t.definition.name == tool.definition.name)
        {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    /// Returns the definitions of all registered tools.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    /// Returns `true` if a tool named `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn find(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.iter().find(|t| t.definition.name == name)
    }

    /// Calls the tool named `name`.
    ///
    /// Unknown tools and handler failures produce error results.
    pub async fn dispatch(&self, name: &str, arguments: Value) -> ToolCallResult {
        let Some(tool) = self.find(name) else {
            tracing::warn!(tool = name, "Call to unknown tool");
            return ToolCallResult::error(format!("Unknown tool: {name}"));
        };

        match tool.handler.call(arguments).await {
            Ok(text) => ToolCallResult::text(text),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call failed");
                ToolCallResult::error(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn call(&self, arguments: Value) -> Result<String, ToolError> {
            arguments
                .get("text")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ToolError::invalid_argument("text is required"))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register("echo", "Echo text", json!({"type": "object"}), Echo);
        registry
    }

    #[tokio::test]
    async fn dispatch_success() {
        let result = registry().dispatch("echo", json!({"text": "hi"})).await;
        assert!(!result.is_error);
        assert_eq!(result.first_text(), Some("hi"));
    }

    #[tokio::test]
    async fn dispatch_handler_error() {
        let result = registry().dispatch("echo", json!({})).await;
        assert!(result.is_error);
        assert_eq!(result.first_text(), Some("Invalid argument: text is required"));
    }

    #[tokio::test]
    async fn dispatch_unknown_tool() {
        let result = registry().dispatch("missing", json!({})).await;
        assert!(result.is_error);
        assert_eq!(result.first_text(), Some("Unknown tool: missing"));
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = registry();
        registry.register("echo", "Echo v2", json!({"type": "object"}), Echo);

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.definitions()[0].description.as_deref(),
            Some("Echo v2")
        );
    }

    #[test]
    fn tool_call_result_serialisation() {
        let ok = serde_json::to_value(ToolCallResult::text("done")).unwrap();
        assert_eq!(ok, json!({"content": [{"type": "text", "text": "done"}]}));

        let err = serde_json::to_value(ToolCallResult::error("boom")).unwrap();
        assert_eq!(
            err,
            json!({"content": [{"type": "text", "text": "boom"}], "isError": true})
        );
    }
}
