//! MCP client: calls a remote MCP server over HTTP
//!
//! Each call is one POST carrying one JSON-RPC envelope. The client never
//! retries; that is the caller's decision.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::McpError;
use crate::protocol::*;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// MCP client bound to a single server endpoint
pub struct McpClient {
    http: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl McpClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send initialize handshake and return the server's capabilities
    pub async fn initialize(&self) -> Result<ServerCapabilities, McpError> {
        Ok(self.initialize_result().await?.capabilities)
    }

    /// Send initialize handshake and return the full result
    pub async fn initialize_result(&self) -> Result<InitializeResult, McpError> {
        let result: InitializeResult = self
            .call(
                methods::INITIALIZE,
                serde_json::json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": "tether",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            )
            .await?;

        debug!(
            "MCP initialize: {} {} (protocol {})",
            result.server_info.name, result.server_info.version, result.protocol_version
        );
        Ok(result)
    }

    pub async fn list_tools(&self) -> Result<Vec<ToolInfo>, McpError> {
        let result: ListToolsResult = self.call(methods::TOOLS_LIST, Value::Null).await?;
        Ok(result.tools)
    }

    /// Call a tool on the MCP server
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult, McpError> {
        let arguments = if arguments.is_null() {
            serde_json::json!({})
        } else {
            arguments
        };
        self.call(
            methods::TOOLS_CALL,
            serde_json::json!({
                "name": name,
                "arguments": arguments,
            }),
        )
        .await
    }

    pub async fn list_resources(&self) -> Result<Vec<Resource>, McpError> {
        let result: ListResourcesResult = self.call(methods::RESOURCES_LIST, Value::Null).await?;
        Ok(result.resources)
    }

    pub async fn list_prompts(&self) -> Result<Vec<Prompt>, McpError> {
        let result: ListPromptsResult = self.call(methods::PROMPTS_LIST, Value::Null).await?;
        Ok(result.prompts)
    }

    pub async fn ping(&self) -> Result<(), McpError> {
        let _: Value = self.call(methods::PING, Value::Null).await?;
        Ok(())
    }

    /// Send a JSON-RPC request and decode its result
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);

        debug!("MCP request {} (id {}) -> {}", method, id, self.endpoint);

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| McpError::Transport {
                endpoint: self.endpoint.clone(),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(McpError::Status { status, body });
        }

        let response: JsonRpcResponse = resp
            .json()
            .await
            .map_err(|e| McpError::Decode(format!("{} response: {}", method, e)))?;

        if let Some(error) = response.error {
            return Err(McpError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        let expected = Value::from(id);
        if response.id != expected {
            return Err(McpError::IdMismatch {
                expected,
                got: response.id,
            });
        }

        serde_json::from_value(response.result.unwrap_or(Value::Null))
            .map_err(|e| McpError::Decode(format!("{} result: {}", method, e)))
    }
}
