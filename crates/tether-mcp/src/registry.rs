//! Registry of named MCP servers with failure-tolerant tool discovery
//!
//! Discovery queries every registered server concurrently. A server that is
//! down is logged and skipped; only when every server fails does discovery
//! return an error. Output order is registration order, then each server's
//! own list order, regardless of which server answered first.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use tether_core::Tool;

use crate::bridge::bridge_tools;
use crate::client::{DEFAULT_TIMEOUT, McpClient};
use crate::error::McpError;

/// A registered MCP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEntry {
    pub name: String,
    pub endpoint: String,
    pub tags: Vec<String>,
}

/// A discovered tool and the server it came from
#[derive(Clone)]
pub struct DiscoveredTool {
    pub server: String,
    pub tool: Arc<dyn Tool>,
}

/// Tracks MCP servers by name. Holds no tool state of its own; every
/// discovery call re-fetches.
pub struct McpRegistry {
    servers: RwLock<Vec<ServerEntry>>,
    timeout: Duration,
}

impl Default for McpRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl McpRegistry {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a registry whose per-request timeout is `timeout`.
    /// An unresponsive server counts as failed once it elapses.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            servers: RwLock::new(Vec::new()),
            timeout,
        }
    }

    /// Register a server. Re-adding a name replaces that entry in place.
    pub async fn add_server<I, S>(&self, name: impl Into<String>, endpoint: impl Into<String>, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = ServerEntry {
            name: name.into(),
            endpoint: endpoint.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        };
        debug!("Registering MCP server {} at {}", entry.name, entry.endpoint);

        let mut servers = self.servers.write().await;
        match servers.iter_mut().find(|s| s.name == entry.name) {
            Some(existing) => *existing = entry,
            None => servers.push(entry),
        }
    }

    /// Remove a server. Returns whether it was registered.
    pub async fn remove_server(&self, name: &str) -> bool {
        let mut servers = self.servers.write().await;
        let before = servers.len();
        servers.retain(|s| s.name != name);
        servers.len() != before
    }

    /// Registered servers in registration order
    pub async fn servers(&self) -> Vec<ServerEntry> {
        self.servers.read().await.clone()
    }

    pub async fn servers_with_tag(&self, tag: &str) -> Vec<ServerEntry> {
        self.servers
            .read()
            .await
            .iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .cloned()
            .collect()
    }

    /// Discover tools from every registered server
    pub async fn discover_tools(&self) -> Result<Vec<DiscoveredTool>, McpError> {
        let servers = self.servers().await;
        self.discover_across(&servers).await
    }

    /// Discover tools from every server carrying `tag`
    pub async fn discover_tools_with_tag(&self, tag: &str) -> Result<Vec<DiscoveredTool>, McpError> {
        let servers = self.servers_with_tag(tag).await;
        self.discover_across(&servers).await
    }

    /// Discover tools from one named server. Any failure is returned as is.
    pub async fn discover_tools_from_server(&self, name: &str) -> Result<Vec<DiscoveredTool>, McpError> {
        let entry = {
            let servers = self.servers.read().await;
            servers.iter().find(|s| s.name == name).cloned()
        };
        let entry = entry.ok_or_else(|| McpError::UnknownServer(name.to_string()))?;
        self.discover_from(&entry).await
    }

    /// All discovered tools without their provenance
    pub async fn tools(&self) -> Result<Vec<Arc<dyn Tool>>, McpError> {
        Ok(self
            .discover_tools()
            .await?
            .into_iter()
            .map(|d| d.tool)
            .collect())
    }

    async fn discover_across(&self, servers: &[ServerEntry]) -> Result<Vec<DiscoveredTool>, McpError> {
        if servers.is_empty() {
            return Ok(Vec::new());
        }

        let results = join_all(servers.iter().map(|entry| self.discover_from(entry))).await;

        let mut tools = Vec::new();
        let mut failures = Vec::new();
        for (entry, result) in servers.iter().zip(results) {
            match result {
                Ok(found) => tools.extend(found),
                Err(e) => {
                    warn!("MCP server '{}' discovery failed: {}", entry.name, e);
                    failures.push((entry.name.clone(), e));
                }
            }
        }

        if failures.len() == servers.len() {
            return Err(McpError::AllServersFailed(failures));
        }

        info!(
            "Discovered {} tools from {} of {} MCP servers",
            tools.len(),
            servers.len() - failures.len(),
            servers.len()
        );
        Ok(tools)
    }

    async fn discover_from(&self, entry: &ServerEntry) -> Result<Vec<DiscoveredTool>, McpError> {
        let client = Arc::new(McpClient::with_timeout(&entry.endpoint, self.timeout));
        client.initialize().await?;
        let infos = client.list_tools().await?;

        debug!("MCP server '{}' advertised {} tools", entry.name, infos.len());

        Ok(bridge_tools(&client, infos, Some(&entry.name))
            .into_iter()
            .map(|tool| DiscoveredTool {
                server: entry.name.clone(),
                tool: Arc::new(tool),
            })
            .collect())
    }
}
