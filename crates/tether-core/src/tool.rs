//! Tool capability and tool output types

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// One part of a tool's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    /// Binary content referenced by URL. Not carried by the tool protocol yet.
    Image { url: String, mime_type: String },
}

impl ContentPart {
    /// The text of a text part, `None` for every other kind
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Result of executing a tool.
///
/// `is_error` marks a failure the tool reported as content (for example a
/// validation message meant for the model), as opposed to `Err` from
/// [`Tool::execute`], which means the tool could not run at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: Vec<ContentPart>,
    pub is_error: bool,
}

impl ToolOutput {
    /// Successful output with a single text part
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::Text(text.into())],
            is_error: false,
        }
    }

    /// Tool-reported failure with a single text part
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::Text(text.into())],
            is_error: true,
        }
    }

    /// All text parts joined with newlines
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentPart::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A callable tool.
///
/// `ctx` is cancelled when the caller no longer wants the result. Honoring it
/// is up to the implementation; nothing interrupts a tool that ignores it.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> Value;
    async fn execute(&self, ctx: CancellationToken, input: Value) -> Result<ToolOutput>;
}

/// Helper function to create a JSON schema for tool input
pub fn json_schema(properties: Value, required: Vec<&str>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct DummyTool;

    #[async_trait]
    impl Tool for DummyTool {
        fn name(&self) -> &str {
            "dummy"
        }

        fn description(&self) -> &str {
            "A dummy tool for testing"
        }

        fn input_schema(&self) -> Value {
            json_schema(
                serde_json::json!({
                    "message": {
                        "type": "string",
                        "description": "Test message"
                    }
                }),
                vec!["message"],
            )
        }

        async fn execute(&self, ctx: CancellationToken, input: Value) -> Result<ToolOutput> {
            if ctx.is_cancelled() {
                anyhow::bail!("canceled");
            }
            let message = input.get("message").and_then(|v| v.as_str()).unwrap_or("");
            Ok(ToolOutput::text(format!("dummy: {}", message)))
        }
    }

    #[tokio::test]
    async fn test_tool_as_trait_object() {
        let tool: Arc<dyn Tool> = Arc::new(DummyTool);
        assert_eq!(tool.name(), "dummy");
        let output = tool
            .execute(CancellationToken::new(), serde_json::json!({"message": "hi"}))
            .await
            .unwrap();
        assert_eq!(output, ToolOutput::text("dummy: hi"));
    }

    #[tokio::test]
    async fn test_tool_sees_cancellation() {
        let ctx = CancellationToken::new();
        ctx.cancel();
        let result = DummyTool.execute(ctx, serde_json::json!({})).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_json_schema() {
        let schema = json_schema(
            serde_json::json!({
                "name": {"type": "string"}
            }),
            vec!["name"],
        );
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"][0], "name");
    }

    #[test]
    fn test_text_content_skips_non_text_parts() {
        let output = ToolOutput {
            content: vec![
                ContentPart::Text("one".to_string()),
                ContentPart::Image {
                    url: "file:///a.png".to_string(),
                    mime_type: "image/png".to_string(),
                },
                ContentPart::Text("two".to_string()),
            ],
            is_error: false,
        };
        assert_eq!(output.text_content(), "one\ntwo");
    }

    #[test]
    fn test_error_output() {
        let output = ToolOutput::error("bad input");
        assert!(output.is_error);
        assert_eq!(output.content[0].as_text(), Some("bad input"));
    }
}
