//! Error types for the A2A client, remote agent and HTTP server.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum A2aError {
    /// The HTTP round trip itself failed (refused, timed out, reset).
    #[error("a2a/{op}: request to {url} failed: {source}")]
    Transport {
        op: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with an unexpected HTTP status. `message` is the
    /// server's `{error}` text when it sent one.
    #[error("a2a/{op}: HTTP {status}: {message}")]
    Status {
        op: &'static str,
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("a2a/{op}: invalid response: {message}")]
    Decode { op: &'static str, message: String },
    /// The remote task reached `failed`.
    #[error("task failed: {0}")]
    TaskFailed(String),
    /// The remote task reached `canceled`.
    #[error("task canceled")]
    TaskCanceled,
    /// The caller stopped waiting. The remote task is left running.
    #[error("a2a/invoke: polling canceled")]
    PollingCanceled,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors from running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(String),
}
