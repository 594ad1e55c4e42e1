//! Model Context Protocol (MCP) server implementation.
//!
//! The server speaks JSON-RPC 2.0 over a newline-delimited stream (stdio in
//! production) and exposes registered tools to AI assistants.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │   ┌─────────────┐    ┌─────────────┐    ┌──────────────┐     │
//! │   │  Transport  │───▶│   Server    │───▶│   Registry   │     │
//! │   │ (line JSON) │    │ (lifecycle) │    │ (tool calls) │     │
//! │   └─────────────┘    └─────────────┘    └──────────────┘     │
//! │                                                │             │
//! │                                                ▼             │
//! │                                       ┌────────────────┐     │
//! │                                       │  Tool handlers │     │
//! │                                       └────────────────┘     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod protocol;
pub mod registry;
pub mod server;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use registry::{ToolCallResult, ToolContent, ToolHandler, ToolRegistry};
pub use server::McpServer;
pub use transport::{StdioTransport, Transport};
