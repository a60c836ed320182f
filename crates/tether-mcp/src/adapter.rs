//! Adapter between tether's `Tool` types and the MCP wire format

use tracing::debug;

use tether_core::{ContentPart, Tool, ToolOutput};

use crate::protocol::{ContentItem, ToolCallResult, ToolInfo};

/// Describe a local tool as an MCP tool definition
pub fn tool_info(tool: &dyn Tool) -> ToolInfo {
    ToolInfo {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        input_schema: tool.input_schema(),
    }
}

/// Convert a local tool's output into an MCP tool call result.
///
/// Only text parts cross the wire. Other parts are dropped here.
// TODO: carry image parts once ContentItem grows an image variant.
pub fn to_wire_result(output: &ToolOutput) -> ToolCallResult {
    let content: Vec<ContentItem> = output
        .content
        .iter()
        .filter_map(ContentPart::as_text)
        .map(ContentItem::text)
        .collect();

    let dropped = output.content.len() - content.len();
    if dropped > 0 {
        debug!("Dropped {} non-text content part(s) from tool result", dropped);
    }

    ToolCallResult {
        content,
        is_error: output.is_error,
    }
}

/// Convert an MCP tool call result back into local tool output
pub fn from_wire_result(result: ToolCallResult) -> ToolOutput {
    let content = result
        .content
        .into_iter()
        .filter_map(|item| match item {
            ContentItem::Text { text } => Some(ContentPart::Text(text)),
            ContentItem::Unknown => None,
        })
        .collect();

    ToolOutput {
        content,
        is_error: result.is_error,
    }
}
