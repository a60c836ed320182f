//! Client ⇄ server round trips over real HTTP

mod common;

use std::sync::Arc;

use axum::Router;
use axum::routing::post;
use serde_json::{Value, json};

use common::{EchoTool, spawn_echo_server, spawn_router, spawn_server};
use tether_core::{CancellationToken, ContentPart, Tool};
use tether_mcp::protocol::{INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND};
use tether_mcp::{
    ContentItem, McpClient, McpError, McpServer, Prompt, PromptArgument, Resource, ToolCallResult,
    from_mcp,
};

#[tokio::test]
async fn echo_tool_call_end_to_end() {
    let (url, echo) = spawn_echo_server().await;
    let client = McpClient::new(url);

    let result = client.call_tool("echo", json!({"text": "hi"})).await.unwrap();
    assert_eq!(
        result,
        ToolCallResult {
            content: vec![ContentItem::text("echo: hi")],
            is_error: false,
        }
    );
    assert_eq!(echo.calls(), 1);

    client.call_tool("echo", json!({"text": "again"})).await.unwrap();
    assert_eq!(echo.calls(), 2);
}

#[tokio::test]
async fn initialize_reports_all_capabilities() {
    let (url, _) = spawn_echo_server().await;
    let client = McpClient::new(url);

    let caps = client.initialize().await.unwrap();
    assert!(caps.tools.is_some());
    assert!(caps.resources.is_some());
    assert!(caps.prompts.is_some());

    let full = client.initialize_result().await.unwrap();
    assert_eq!(full.server_info.name, "test-server");
    assert_eq!(full.server_info.version, "1.0.0");
}

#[tokio::test]
async fn list_tools_returns_registered_set() {
    let (url, _) = spawn_echo_server().await;
    let tools = McpClient::new(url).list_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "echo");
    assert_eq!(tools[0].description, "Echoes input text");
}

#[tokio::test]
async fn unknown_tool_is_invalid_params() {
    let (url, echo) = spawn_echo_server().await;
    let err = McpClient::new(url)
        .call_tool("nonexistent", Value::Null)
        .await
        .unwrap_err();
    assert_eq!(err.rpc_code(), Some(INVALID_PARAMS));
    assert!(err.to_string().contains("-32602"));
    assert_eq!(echo.calls(), 0);
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let (url, _) = spawn_echo_server().await;
    let err = McpClient::new(url)
        .call::<Value>("nonexistent/method", Value::Null)
        .await
        .unwrap_err();
    assert_eq!(err.rpc_code(), Some(METHOD_NOT_FOUND));
}

#[tokio::test]
async fn resources_and_prompts_round_trip() {
    let server = McpServer::new("test", "1.0.0");
    server
        .add_resource(Resource {
            uri: "file:///test.txt".to_string(),
            name: "test-file".to_string(),
            description: "A test resource".to_string(),
            mime_type: "text/plain".to_string(),
        })
        .await
        .add_prompt(Prompt {
            name: "greet".to_string(),
            description: "A greeting prompt".to_string(),
            arguments: vec![PromptArgument {
                name: "name".to_string(),
                description: "Name to greet".to_string(),
                required: true,
            }],
        })
        .await;
    let client = McpClient::new(spawn_server(&server).await);

    let resources = client.list_resources().await.unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].uri, "file:///test.txt");

    let prompts = client.list_prompts().await.unwrap();
    assert_eq!(prompts[0].name, "greet");
    assert!(prompts[0].arguments[0].required);

    client.ping().await.unwrap();
}

#[tokio::test]
async fn rpc_error_is_propagated_with_code() {
    let router = Router::new().route(
        "/",
        post(|body: axum::Json<Value>| async move {
            axum::Json(json!({
                "jsonrpc": "2.0",
                "id": body.0["id"],
                "error": {"code": INTERNAL_ERROR, "message": "internal error"}
            }))
        }),
    );
    let client = McpClient::new(spawn_router(router).await);
    match client.initialize().await {
        Err(McpError::Rpc { code, message }) => {
            assert_eq!(code, INTERNAL_ERROR);
            assert_eq!(message, "internal error");
        }
        other => panic!("expected rpc error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn invalid_json_response_is_decode_error() {
    let router = Router::new().route("/", post(|| async { "not json" }));
    let client = McpClient::new(spawn_router(router).await);
    let err = client.call_tool("echo", Value::Null).await.unwrap_err();
    assert!(matches!(err, McpError::Decode(_)));
}

#[tokio::test]
async fn mismatched_response_id_is_rejected() {
    let router = Router::new().route(
        "/",
        post(|| async { axum::Json(json!({"jsonrpc": "2.0", "id": 999_999, "result": {}})) }),
    );
    let client = McpClient::new(spawn_router(router).await);
    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, McpError::IdMismatch { .. }));
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let router = Router::new().route(
        "/",
        post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let client = McpClient::new(spawn_router(router).await);
    match client.list_tools().await {
        Err(McpError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 502);
            assert_eq!(body, "upstream down");
        }
        other => panic!("expected status error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn from_mcp_bridges_remote_tools() {
    let (url, echo) = spawn_echo_server().await;
    let tools = from_mcp(&url).await.unwrap();
    assert_eq!(tools.len(), 1);

    let tool = &tools[0];
    assert_eq!(tool.name(), "echo");
    assert_eq!(tool.description(), "Echoes input text");
    assert_eq!(tool.input_schema()["type"], "object");

    let output = tool
        .execute(CancellationToken::new(), json!({"text": "test"}))
        .await
        .unwrap();
    assert!(!output.is_error);
    assert_eq!(output.content, vec![ContentPart::Text("echo: test".to_string())]);
    assert_eq!(echo.calls(), 1);
}

#[tokio::test]
async fn bridged_tool_reports_remote_is_error() {
    struct Failing;

    #[async_trait::async_trait]
    impl Tool for Failing {
        fn name(&self) -> &str {
            "fail"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(
            &self,
            _ctx: CancellationToken,
            _input: Value,
        ) -> anyhow::Result<tether_core::ToolOutput> {
            Ok(tether_core::ToolOutput::error("something went wrong"))
        }
    }

    let server = McpServer::new("test", "1.0.0");
    server.add_tool(Arc::new(Failing)).await;
    let tools = from_mcp(&spawn_server(&server).await).await.unwrap();

    let output = tools[0].execute(CancellationToken::new(), Value::Null).await.unwrap();
    assert!(output.is_error);
    assert_eq!(output.text_content(), "something went wrong");
}

#[tokio::test]
async fn from_mcp_fails_when_tools_list_fails() {
    let router = Router::new().route(
        "/",
        post(|body: axum::Json<Value>| async move {
            let id = body.0["id"].clone();
            if body.0["method"] == "initialize" {
                axum::Json(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": {
                        "protocolVersion": "2025-03-26",
                        "serverInfo": {"name": "half", "version": "0"},
                        "capabilities": {"tools": {}}
                    }
                }))
            } else {
                axum::Json(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {"code": INTERNAL_ERROR, "message": "list failed"}
                }))
            }
        }),
    );
    let url = spawn_router(router).await;
    assert!(from_mcp(&url).await.is_err());
}

#[tokio::test]
async fn concurrent_calls_each_execute_once() {
    let server = McpServer::new("test", "1.0.0");
    let echo = EchoTool::new();
    server.add_tool(echo.clone()).await;
    let client = Arc::new(McpClient::new(spawn_server(&server).await));

    let calls = (0..8).map(|i| {
        let client = client.clone();
        tokio::spawn(async move { client.call_tool("echo", json!({"text": i.to_string()})).await })
    });
    for (i, handle) in calls.enumerate() {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.content, vec![ContentItem::text(format!("echo: {}", i))]);
    }
    assert_eq!(echo.calls(), 8);
}
