//! MCP (Model Context Protocol) support for tether
//!
//! Provides both server (expose local tools, resources and prompts over a
//! single HTTP JSON-RPC endpoint) and client (consume tools from one or many
//! remote MCP servers as if they were local) functionality.

pub mod adapter;
pub mod bridge;
pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;

pub use bridge::{RemoteTool, from_mcp};
pub use client::McpClient;
pub use error::{McpError, ServerError};
pub use protocol::{
    ContentItem, Prompt, PromptArgument, Resource, ServerCapabilities, ToolCallResult, ToolInfo,
};
pub use registry::{DiscoveredTool, McpRegistry, ServerEntry};
pub use server::McpServer;
