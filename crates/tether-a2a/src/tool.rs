//! `delegate_to_agent` tool: delegates tasks to peer A2A agents

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tether_core::{Tool, ToolOutput};

use crate::client::A2aClient;
use crate::error::A2aError;
use crate::protocol::TaskRequest;
use crate::remote::{PollConfig, RemoteAgent};

/// A known peer agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAgent {
    pub name: String,
    pub url: String,
}

/// Tool that delegates a task to a peer A2A agent
pub struct DelegateToAgentTool {
    peers: Vec<PeerAgent>,
    poll: PollConfig,
}

impl DelegateToAgentTool {
    pub fn new(peers: Vec<PeerAgent>) -> Self {
        Self {
            peers,
            poll: PollConfig::default(),
        }
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn peers(&self) -> &[PeerAgent] {
        &self.peers
    }

    /// A peer name, or a raw `http(s)://` URL
    fn resolve(&self, agent: &str) -> Result<String> {
        if agent.starts_with("http://") || agent.starts_with("https://") {
            return Ok(agent.to_string());
        }
        self.peers
            .iter()
            .find(|p| p.name == agent)
            .map(|p| p.url.clone())
            .ok_or_else(|| {
                anyhow!(
                    "Unknown agent '{}'. Known agents: {}",
                    agent,
                    self.peers
                        .iter()
                        .map(|p| p.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

#[async_trait]
impl Tool for DelegateToAgentTool {
    fn name(&self) -> &str {
        "delegate_to_agent"
    }

    fn description(&self) -> &str {
        "Delegate a task to a peer AI agent via the A2A protocol. \
         The agent will execute the task and return the result."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "agent": {
                    "type": "string",
                    "description": "Name of a known agent or full URL of the agent"
                },
                "task": {
                    "type": "string",
                    "description": "Task description for the agent to execute"
                },
                "context": {
                    "type": "object",
                    "description": "Optional context passed to the agent as task metadata"
                },
                "wait": {
                    "type": "boolean",
                    "description": "If true, wait for completion. If false, return the task ID immediately.",
                    "default": true
                }
            },
            "required": ["agent", "task"]
        })
    }

    async fn execute(&self, ctx: CancellationToken, input: Value) -> Result<ToolOutput> {
        let agent = input
            .get("agent")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("Missing 'agent' parameter"))?;
        let task = input
            .get("task")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("Missing 'task' parameter"))?;
        let wait = input.get("wait").and_then(|v| v.as_bool()).unwrap_or(true);

        let mut request = TaskRequest::new(task);
        if let Some(context) = input.get("context").and_then(|v| v.as_object()) {
            request = request.with_metadata(context.clone());
        }

        let url = self.resolve(agent)?;
        debug!(
            "Delegating task to agent at {}: {}",
            url,
            task.chars().take(100).collect::<String>()
        );

        let client = A2aClient::new(&url);

        if !wait {
            let submitted = tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(A2aError::PollingCanceled.into()),
                task = client.create_task(&request) => task?,
            };
            return Ok(ToolOutput::text(format!(
                "Task submitted to agent. Task ID: {} (status: {})",
                submitted.id, submitted.status
            )));
        }

        let remote = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(A2aError::PollingCanceled.into()),
            remote = RemoteAgent::connect_with(client, self.poll) => remote?,
        };
        info!("Delegating to agent '{}'", remote.card().name);

        match remote.run(ctx, &request).await {
            Ok(output) => Ok(ToolOutput::text(output)),
            // The peer ran and reported failure: surface it as tool content.
            Err(e @ (A2aError::TaskFailed(_) | A2aError::TaskCanceled)) => {
                Ok(ToolOutput::error(e.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peers() -> Vec<PeerAgent> {
        vec![PeerAgent {
            name: "research".to_string(),
            url: "http://localhost:3000".to_string(),
        }]
    }

    #[test]
    fn test_tool_schema() {
        let tool = DelegateToAgentTool::new(vec![]);
        assert_eq!(tool.name(), "delegate_to_agent");
        let schema = tool.input_schema();
        assert_eq!(schema["type"], "object");
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&serde_json::json!("agent")));
        assert!(required.contains(&serde_json::json!("task")));
    }

    #[test]
    fn test_resolve_by_name_or_url() {
        let tool = DelegateToAgentTool::new(peers());
        assert_eq!(tool.resolve("research").unwrap(), "http://localhost:3000");
        assert_eq!(
            tool.resolve("https://peer.example/").unwrap(),
            "https://peer.example/"
        );
        let err = tool.resolve("nobody").unwrap_err().to_string();
        assert!(err.contains("nobody"));
        assert!(err.contains("research"));
    }

    #[tokio::test]
    async fn test_missing_parameters() {
        let tool = DelegateToAgentTool::new(peers());
        let ctx = CancellationToken::new();
        assert!(
            tool.execute(ctx.clone(), serde_json::json!({"task": "x"}))
                .await
                .is_err()
        );
        assert!(
            tool.execute(ctx, serde_json::json!({"agent": "research"}))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_delegating() {
        let tool = DelegateToAgentTool::new(peers());
        let ctx = CancellationToken::new();
        ctx.cancel();
        for wait in [true, false] {
            let err = tool
                .execute(
                    ctx.clone(),
                    serde_json::json!({"agent": "research", "task": "x", "wait": wait}),
                )
                .await
                .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<A2aError>(),
                Some(A2aError::PollingCanceled)
            ));
        }
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_an_error() {
        let tool = DelegateToAgentTool::new(vec![]);
        let result = tool
            .execute(
                CancellationToken::new(),
                serde_json::json!({"agent": "http://127.0.0.1:1", "task": "x"}),
            )
            .await;
        assert!(result.is_err());
    }
}
