//! Shared agents and server helpers for A2A integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;

use tether_a2a::{A2aServer, AgentCard, AgentSkill, PollConfig};
use tether_core::{Agent, CancellationToken, Persona};

/// Replies `"response: " + input`, or a fixed output when one is set
pub struct MockAgent {
    pub id: &'static str,
    pub output: Option<&'static str>,
}

impl MockAgent {
    pub fn echo(id: &'static str) -> Arc<Self> {
        Arc::new(Self { id, output: None })
    }

    pub fn fixed(id: &'static str, output: &'static str) -> Arc<Self> {
        Arc::new(Self {
            id,
            output: Some(output),
        })
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn id(&self) -> &str {
        self.id
    }

    fn persona(&self) -> Persona {
        Persona {
            role: self.id.to_string(),
            ..Persona::default()
        }
    }

    async fn invoke(&self, _ctx: CancellationToken, input: &str) -> anyhow::Result<String> {
        Ok(match self.output {
            Some(output) => output.to_string(),
            None => format!("response: {}", input),
        })
    }
}

pub struct FailingAgent;

#[async_trait]
impl Agent for FailingAgent {
    fn id(&self) -> &str {
        "fail-agent"
    }

    fn persona(&self) -> Persona {
        Persona::default()
    }

    async fn invoke(&self, _ctx: CancellationToken, _input: &str) -> anyhow::Result<String> {
        anyhow::bail!("agent failure")
    }
}

/// Runs for `delay` unless cancelled first
pub struct SlowAgent {
    pub delay: Duration,
    pub honors_cancel: bool,
}

#[async_trait]
impl Agent for SlowAgent {
    fn id(&self) -> &str {
        "slow-agent"
    }

    fn persona(&self) -> Persona {
        Persona::default()
    }

    async fn invoke(&self, ctx: CancellationToken, _input: &str) -> anyhow::Result<String> {
        if self.honors_cancel {
            tokio::select! {
                _ = ctx.cancelled() => anyhow::bail!("canceled"),
                _ = tokio::time::sleep(self.delay) => Ok("done".to_string()),
            }
        } else {
            tokio::time::sleep(self.delay).await;
            Ok("done".to_string())
        }
    }
}

pub fn test_card(name: &str) -> AgentCard {
    AgentCard {
        name: name.to_string(),
        description: "A test agent".to_string(),
        version: "1.0.0".to_string(),
        capabilities: vec!["text".to_string()],
        endpoint: "http://localhost:9090".to_string(),
        skills: vec![AgentSkill {
            name: "echo".to_string(),
            description: "Echoes input".to_string(),
        }],
    }
}

/// Fast polling so tests do not wait on the default schedule
pub fn fast_poll() -> PollConfig {
    PollConfig {
        initial: Duration::from_millis(5),
        max: Duration::from_millis(50),
    }
}

/// Serve `router` on an ephemeral port and return its base URL
pub async fn spawn_router(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn spawn_agent(agent: Arc<dyn Agent>) -> (A2aServer, String) {
    let card = test_card(agent.id());
    let server = A2aServer::new(agent, card);
    let url = spawn_router(server.router()).await;
    (server, url)
}

/// Accepts connections and never answers
pub async fn spawn_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}
