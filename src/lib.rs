//! figma-mcp: MCP server giving AI assistants access to Figma design data
//!
//! The server exposes a `get_figma_data` tool that fetches a Figma file (or a
//! single node in it) through the Figma REST API and returns the node tree as
//! YAML, with each node's position available as `top`/`left`.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Error types
//! - [`figma`] — Figma API client, node model and geometry normalisation
//! - [`mcp`] — MCP protocol, transport, server lifecycle and tool registry
//! - [`tools`] — Tool handlers

pub mod config;
pub mod error;
pub mod figma;
pub mod mcp;
pub mod tools;
