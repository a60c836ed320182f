//! Remote MCP tools exposed as local `Tool`s

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tether_core::{Tool, ToolOutput};

use crate::adapter::from_wire_result;
use crate::client::McpClient;
use crate::error::McpError;
use crate::protocol::ToolInfo;

/// A tool handler that wraps a tool advertised by a remote MCP server.
///
/// Callers see the remote tool's own name, description and schema.
pub struct RemoteTool {
    client: Arc<McpClient>,
    info: ToolInfo,
    server: Option<String>,
}

impl RemoteTool {
    pub fn new(client: Arc<McpClient>, info: ToolInfo) -> Self {
        Self {
            client,
            info,
            server: None,
        }
    }

    /// Record which named server this tool came from
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    pub fn info(&self) -> &ToolInfo {
        &self.info
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn description(&self) -> &str {
        &self.info.description
    }

    fn input_schema(&self) -> Value {
        self.info.input_schema.clone()
    }

    async fn execute(&self, ctx: CancellationToken, input: Value) -> anyhow::Result<ToolOutput> {
        debug!(
            "Executing MCP tool {} at {}",
            self.info.name,
            self.client.endpoint()
        );

        let result = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(McpError::Canceled.into()),
            result = self.client.call_tool(&self.info.name, input) => result?,
        };

        Ok(from_wire_result(result))
    }
}

/// Wrap every tool definition in a `RemoteTool` sharing one client
pub fn bridge_tools(
    client: &Arc<McpClient>,
    tools: Vec<ToolInfo>,
    server: Option<&str>,
) -> Vec<RemoteTool> {
    tools
        .into_iter()
        .map(|info| {
            let tool = RemoteTool::new(client.clone(), info);
            match server {
                Some(name) => tool.with_server(name),
                None => tool,
            }
        })
        .collect()
}

/// Connect to an MCP server, discover its tools and wrap them as local tools
pub async fn from_mcp(endpoint: &str) -> Result<Vec<Arc<dyn Tool>>, McpError> {
    let client = Arc::new(McpClient::new(endpoint));
    client.initialize().await?;
    let tools = client.list_tools().await?;

    info!("Discovered {} tools from MCP server {}", tools.len(), endpoint);

    Ok(bridge_tools(&client, tools, None)
        .into_iter()
        .map(|t| Arc::new(t) as Arc<dyn Tool>)
        .collect())
}
