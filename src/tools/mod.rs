//! Tools exposed by the server.

pub mod figma_data;

use std::sync::Arc;

use crate::config::OutputFormat;
use crate::figma::FigmaApi;
use crate::mcp::registry::ToolRegistry;

pub use figma_data::GetFigmaData;

/// Registers all tools backed by `api`.
///
/// In development mode tool names carry a `-dev` suffix so that a
/// development build can run next to the installed server.
pub fn register_all(
    registry: &mut ToolRegistry,
    api: Arc<dyn FigmaApi>,
    format: OutputFormat,
    dev_mode: bool,
) {
    registry.register(
        figma_data::tool_name(dev_mode),
        figma_data::DESCRIPTION,
        figma_data::input_schema(),
        GetFigmaData::new(api, format),
    );
}

/// Builds a registry with all tools registered.
#[must_use]
pub fn registry(api: Arc<dyn FigmaApi>, format: OutputFormat, dev_mode: bool) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_all(&mut registry, api, format, dev_mode);
    registry
}
