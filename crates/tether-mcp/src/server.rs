//! MCP server over HTTP
//!
//! Accepts one JSON-RPC envelope per POST on a single endpoint, dispatches by
//! method, and always answers with a well-formed envelope.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use tether_core::Tool;

use crate::adapter::{to_wire_result, tool_info};
use crate::error::ServerError;
use crate::protocol::*;

/// Largest request body the endpoint will read
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// What the server advertises. Registration only ever appends (or replaces a
/// tool of the same name in place).
#[derive(Default)]
struct Catalog {
    tools: Vec<Arc<dyn Tool>>,
    resources: Vec<Resource>,
    prompts: Vec<Prompt>,
}

struct Inner {
    name: String,
    version: String,
    capabilities: ServerCapabilities,
    catalog: RwLock<Catalog>,
    /// Parent of every call's token; cancelled when serving shuts down
    calls: CancellationToken,
}

/// MCP server that serves tools, resources and prompts over HTTP.
///
/// Cloning is cheap and every clone shares the same registries.
#[derive(Clone)]
pub struct McpServer {
    inner: Arc<Inner>,
    call_timeout: Option<Duration>,
}

impl McpServer {
    /// Create a server advertising tools, resources and prompts
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                version: version.into(),
                capabilities: ServerCapabilities::all(),
                catalog: RwLock::new(Catalog::default()),
                calls: CancellationToken::new(),
            }),
            call_timeout: None,
        }
    }

    /// Cancel a tool's context once it has run for `timeout`.
    ///
    /// The tool still decides when to return; the call answers with whatever
    /// it produces after observing the cancellation.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn version(&self) -> &str {
        &self.inner.version
    }

    /// Register a tool. A tool with the same name is replaced in place.
    pub async fn add_tool(&self, tool: Arc<dyn Tool>) -> &Self {
        let mut catalog = self.inner.catalog.write().await;
        debug!("Registering MCP tool: {}", tool.name());
        match catalog.tools.iter().position(|t| t.name() == tool.name()) {
            Some(index) => catalog.tools[index] = tool,
            None => catalog.tools.push(tool),
        }
        self
    }

    pub async fn add_resource(&self, resource: Resource) -> &Self {
        self.inner.catalog.write().await.resources.push(resource);
        self
    }

    pub async fn add_prompt(&self, prompt: Prompt) -> &Self {
        self.inner.catalog.write().await.prompts.push(prompt);
        self
    }

    /// Current tool definitions, in registration order
    pub async fn list_tools(&self) -> Vec<ToolInfo> {
        let catalog = self.inner.catalog.read().await;
        catalog.tools.iter().map(|t| tool_info(t.as_ref())).collect()
    }

    pub async fn resources(&self) -> Vec<Resource> {
        self.inner.catalog.read().await.resources.clone()
    }

    pub async fn prompts(&self) -> Vec<Prompt> {
        self.inner.catalog.read().await.prompts.clone()
    }

    async fn find_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let catalog = self.inner.catalog.read().await;
        catalog.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Build the axum router serving the endpoint at `/`
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", any(handle_http))
            .with_state(self.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind `addr` and serve until `shutdown` is cancelled
    pub async fn serve(&self, addr: &str, shutdown: CancellationToken) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_string(),
                source: e,
            })?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` is cancelled.
    ///
    /// Shutdown also cancels the context of every tool call still running,
    /// and of any call made on this server afterwards.
    pub async fn serve_listener(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), ServerError> {
        if let Ok(addr) = listener.local_addr() {
            info!("MCP server '{}' listening on http://{}/", self.inner.name, addr);
        }

        let calls = self.inner.calls.clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                calls.cancel();
            })
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        info!("MCP server '{}' stopped", self.inner.name);
        Ok(())
    }

    /// Decode a raw request body and dispatch it
    pub async fn handle_body(&self, body: &[u8]) -> JsonRpcResponse {
        let value: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => {
                warn!("Invalid JSON-RPC body: {}", e);
                return JsonRpcResponse::error(Value::Null, PARSE_ERROR, format!("Parse error: {}", e));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                );
            }
        };

        self.handle_request(request).await
    }

    /// Handle a single JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id;

        if request.jsonrpc != JSONRPC_VERSION {
            return JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Unsupported jsonrpc version: {:?}", request.jsonrpc),
            );
        }

        debug!("MCP received: {}", request.method);

        match request.method.as_str() {
            methods::INITIALIZE => {
                let result = InitializeResult {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    server_info: ServerInfo {
                        name: self.inner.name.clone(),
                        version: self.inner.version.clone(),
                    },
                    capabilities: self.inner.capabilities.clone(),
                };
                result_response(id, &result)
            }

            methods::PING => JsonRpcResponse::success(id, serde_json::json!({})),

            methods::TOOLS_LIST => {
                let tools = self.list_tools().await;
                debug!("MCP tools/list: returning {} tools", tools.len());
                result_response(id, &ListToolsResult { tools })
            }

            methods::TOOLS_CALL => self.call_tool(id, request.params).await,

            methods::RESOURCES_LIST => {
                let resources = self.resources().await;
                result_response(id, &ListResourcesResult { resources })
            }

            methods::PROMPTS_LIST => {
                let prompts = self.prompts().await;
                result_response(id, &ListPromptsResult { prompts })
            }

            other => {
                warn!("MCP unknown method: {}", other);
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown method: {}", other))
            }
        }
    }

    async fn call_tool(&self, id: Value, params: Value) -> JsonRpcResponse {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid tools/call params: {}", e),
                );
            }
        };

        // The read lock is released here; execution runs unlocked.
        let Some(tool) = self.find_tool(&params.name).await else {
            return JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                format!("Unknown tool: {}", params.name),
            );
        };

        info!("MCP tools/call: {}", params.name);

        // Cancelled on server shutdown, on the call deadline, or when this
        // future is dropped.
        let ctx = self.inner.calls.child_token();
        let _guard = ctx.clone().drop_guard();

        let execution = AssertUnwindSafe(tool.execute(ctx.clone(), params.arguments)).catch_unwind();
        tokio::pin!(execution);

        let outcome = match self.call_timeout {
            Some(limit) => {
                let first = tokio::time::timeout(limit, &mut execution).await;
                match first {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!("Tool {} exceeded {:?}, cancelling", params.name, limit);
                        ctx.cancel();
                        execution.await
                    }
                }
            }
            None => execution.await,
        };

        match outcome {
            Ok(Ok(output)) => result_response(id, &to_wire_result(&output)),
            Ok(Err(e)) => {
                warn!("Tool {} failed: {}", params.name, e);
                JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string())
            }
            Err(_) => {
                warn!("Tool {} panicked", params.name);
                JsonRpcResponse::error(
                    id,
                    INTERNAL_ERROR,
                    format!("Tool {} panicked", params.name),
                )
            }
        }
    }
}

fn result_response<T: Serialize>(id: Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(
            id,
            INTERNAL_ERROR,
            format!("Failed to serialize result: {}", e),
        ),
    }
}

async fn handle_http(State(server): State<McpServer>, request: Request) -> Response {
    if request.method() != Method::POST {
        warn!("MCP rejected HTTP {} request", request.method());
        let response = JsonRpcResponse::error(
            Value::Null,
            INVALID_REQUEST,
            format!("Invalid request: HTTP {} not allowed, use POST", request.method()),
        );
        return (StatusCode::METHOD_NOT_ALLOWED, Json(response)).into_response();
    }

    let response = match to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(body) => server.handle_body(&body).await,
        Err(e) => JsonRpcResponse::error(
            Value::Null,
            PARSE_ERROR,
            format!("Parse error: failed to read body: {}", e),
        ),
    };

    Json(response).into_response()
}
