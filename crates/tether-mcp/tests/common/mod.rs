//! Shared helpers for MCP integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;

use tether_core::{CancellationToken, Tool, ToolOutput, json_schema};
use tether_mcp::McpServer;

/// Returns `"echo: " + input.text`
pub struct EchoTool {
    pub calls: AtomicUsize,
}

impl EchoTool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes input text"
    }

    fn input_schema(&self) -> Value {
        json_schema(serde_json::json!({"text": {"type": "string"}}), vec!["text"])
    }

    async fn execute(&self, _ctx: CancellationToken, input: Value) -> anyhow::Result<ToolOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = input.get("text").and_then(|v| v.as_str()).unwrap_or("");
        Ok(ToolOutput::text(format!("echo: {}", text)))
    }
}

/// A tool with a fixed name that returns its own name
pub struct NamedTool(pub &'static str);

#[async_trait]
impl Tool for NamedTool {
    fn name(&self) -> &str {
        self.0
    }

    fn description(&self) -> &str {
        "named test tool"
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({"type": "object"})
    }

    async fn execute(&self, _ctx: CancellationToken, _input: Value) -> anyhow::Result<ToolOutput> {
        Ok(ToolOutput::text(self.0))
    }
}

/// Serve `router` on an ephemeral port and return its base URL
pub async fn spawn_router(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/", addr)
}

pub async fn spawn_server(server: &McpServer) -> String {
    spawn_router(server.router()).await
}

/// A server with one `echo` tool
pub async fn spawn_echo_server() -> (String, Arc<EchoTool>) {
    let server = McpServer::new("test-server", "1.0.0");
    let echo = EchoTool::new();
    server.add_tool(echo.clone()).await;
    (spawn_server(&server).await, echo)
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
    format!("http://{}/", addr)
}

/// Waits until its context is cancelled (10 s at most). A watcher task
/// records the cancellation even if the call future itself is dropped.
pub struct CancelAwareTool {
    saw_cancel: Arc<AtomicBool>,
}

impl CancelAwareTool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            saw_cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn saw_cancel(&self) -> bool {
        self.saw_cancel.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for CancelAwareTool {
    fn name(&self) -> &str {
        "wait"
    }

    fn description(&self) -> &str {
        "Waits for cancellation"
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({"type": "object"})
    }

    async fn execute(&self, ctx: CancellationToken, _input: Value) -> anyhow::Result<ToolOutput> {
        let watched = ctx.clone();
        let saw_cancel = self.saw_cancel.clone();
        tokio::spawn(async move {
            watched.cancelled().await;
            saw_cancel.store(true, Ordering::SeqCst);
        });

        tokio::select! {
            _ = ctx.cancelled() => anyhow::bail!("cancelled"),
            _ = tokio::time::sleep(Duration::from_secs(10)) => Ok(ToolOutput::text("finished")),
        }
    }
}
