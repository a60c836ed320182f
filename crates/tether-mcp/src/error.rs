//! Error types for the MCP client, registry and HTTP server.

use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by [`crate::McpClient`], [`crate::RemoteTool`] and
/// [`crate::McpRegistry`].
#[derive(Debug, Error)]
pub enum McpError {
    /// The HTTP round trip itself failed (refused, timed out, reset).
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success HTTP status.
    #[error("server returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// The server answered with a JSON-RPC error envelope.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// The response body was not the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("response id {got} does not match request id {expected}")]
    IdMismatch { expected: Value, got: Value },
    #[error("unknown MCP server: {0}")]
    UnknownServer(String),
    /// Every registered server failed during discovery.
    #[error("tool discovery failed on all {} servers: {}", .0.len(), summarize(.0))]
    AllServersFailed(Vec<(String, McpError)>),
    #[error("request canceled")]
    Canceled,
}

impl McpError {
    /// The JSON-RPC error code, if the server sent one
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

fn summarize(failures: &[(String, McpError)]) -> String {
    failures
        .iter()
        .map(|(server, err)| format!("{}: {}", server, err))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(String),
}
