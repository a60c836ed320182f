//! Built-in `echo` tool and echo agent served by `tether serve`

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use tether_core::{Agent, Persona, Tool, ToolOutput, json_schema};

/// Returns `"echo: " + text`
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes the given text back"
    }

    fn input_schema(&self) -> Value {
        json_schema(
            serde_json::json!({
                "text": {
                    "type": "string",
                    "description": "Text to echo"
                }
            }),
            vec!["text"],
        )
    }

    async fn execute(&self, _ctx: CancellationToken, input: Value) -> Result<ToolOutput> {
        let text = input
            .get("text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("Missing 'text' parameter"))?;
        Ok(ToolOutput::text(format!("echo: {}", text)))
    }
}

/// Agent that answers with its input, exposing the echo tool as a skill
pub struct EchoAgent;

#[async_trait]
impl Agent for EchoAgent {
    fn id(&self) -> &str {
        "tether-echo"
    }

    fn persona(&self) -> Persona {
        Persona {
            role: "echo".to_string(),
            goal: "Repeats whatever it is asked".to_string(),
            backstory: String::new(),
        }
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![Arc::new(EchoTool)]
    }

    async fn invoke(&self, ctx: CancellationToken, input: &str) -> Result<String> {
        if ctx.is_cancelled() {
            anyhow::bail!("canceled");
        }
        Ok(format!("echo: {}", input))
    }
}
