//! MCP server validation tests.
//!
//! Tests JSON-RPC 2.0 protocol compliance, tool listing, and error handling.
//! The server is exercised in-process through `handle_message`; no request
//! here ever reaches the browser layer.

use serde_json::{json, Value};

use askalcf::protocol::JsonRpcResponse;
use askalcf::McpServer;

async fn send(server: &McpServer, request: Value) -> Option<JsonRpcResponse> {
    server.handle_message(&request.to_string()).await
}

async fn initialized_server() -> McpServer {
    let server = McpServer::new();
    let response = send(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test-client", "version": "0.1.0"}
            }
        }),
    )
    .await
    .expect("initialize must get a response");
    assert!(response.error.is_none(), "initialize must succeed");
    server
}

fn result_text(response: &JsonRpcResponse) -> &str {
    response
        .result
        .as_ref()
        .and_then(|r| r.get("content"))
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .and_then(|c| c.get("text"))
        .and_then(|t| t.as_str())
        .unwrap_or("")
}

// ============================================================================
// Protocol Compliance Tests
// ============================================================================

#[tokio::test]
async fn initialize_handshake_announces_tools() {
    let server = McpServer::new();
    let response = send(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test-client", "version": "0.1.0"}
            }
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.jsonrpc, "2.0");
    assert!(response.error.is_none());
    let result = response.result.unwrap();
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "askalcf");
    assert!(result["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn initialize_without_params_is_rejected() {
    let server = McpServer::new();
    let response = send(
        &server,
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}),
    )
    .await
    .unwrap();
    assert_eq!(response.error.unwrap().code, -32602);
}

#[tokio::test]
async fn tools_list_contains_the_ask_tools() {
    let server = initialized_server().await;
    let response = send(
        &server,
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
    )
    .await
    .unwrap();

    assert!(response.error.is_none());
    let result = response.result.unwrap();
    let names: Vec<&str> = result["tools"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert!(names.contains(&"alcf_ask_question"));
    assert!(names.contains(&"alcf_get_system_info"));
}

#[tokio::test]
async fn tools_list_before_initialize_is_rejected() {
    let server = McpServer::new();
    let response = send(
        &server,
        json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
    )
    .await
    .unwrap();
    let error = response.error.unwrap();
    assert!(error.message.contains("not initialized"));
}

#[tokio::test]
async fn ping_and_shutdown_respond_with_empty_objects() {
    let server = initialized_server().await;

    let response = send(&server, json!({"jsonrpc": "2.0", "id": 3, "method": "ping"}))
        .await
        .unwrap();
    assert_eq!(response.result.unwrap(), json!({}));

    let response = send(
        &server,
        json!({"jsonrpc": "2.0", "id": 4, "method": "shutdown"}),
    )
    .await
    .unwrap();
    assert!(response.error.is_none());
}

#[tokio::test]
async fn notifications_get_no_response() {
    let server = initialized_server().await;
    let response = send(
        &server,
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    )
    .await;
    assert!(response.is_none());
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[tokio::test]
async fn unknown_method_returns_method_not_found() {
    let server = initialized_server().await;
    let response = send(
        &server,
        json!({"jsonrpc": "2.0", "id": 99, "method": "nonexistent/method"}),
    )
    .await
    .unwrap();
    let error = response.error.unwrap();
    assert_eq!(error.code, -32601);
    assert!(error.message.contains("nonexistent/method"));
}

#[tokio::test]
async fn unknown_tool_returns_method_not_found() {
    let server = initialized_server().await;
    let response = send(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 100,
            "method": "tools/call",
            "params": {"name": "nonexistent_tool", "arguments": {}}
        }),
    )
    .await
    .unwrap();
    let error = response.error.unwrap();
    assert_eq!(error.code, -32601);
    assert!(error.message.contains("nonexistent_tool"));
}

#[tokio::test]
async fn malformed_json_returns_parse_error() {
    let server = McpServer::new();
    let response = server.handle_message("{not json").await.unwrap();
    assert_eq!(response.error.unwrap().code, -32700);
}

#[tokio::test]
async fn too_short_question_is_a_tool_error_not_a_protocol_error() {
    // Validation runs before the browser launches, so this stays cheap.
    let server = initialized_server().await;
    let response = send(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 5,
            "method": "tools/call",
            "params": {"name": "alcf_ask_question", "arguments": {"question": "hi"}}
        }),
    )
    .await
    .unwrap();

    assert!(response.error.is_none(), "validation surfaces as tool output");
    let result = response.result.as_ref().unwrap();
    assert_eq!(result["isError"], true);
    assert!(result_text(&response).contains("between 5 and 1000 characters"));
}

#[tokio::test]
async fn out_of_range_timeout_is_a_tool_error() {
    let server = initialized_server().await;
    let response = send(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 6,
            "method": "tools/call",
            "params": {
                "name": "alcf_ask_question",
                "arguments": {"question": "What is Aurora?", "timeout": 5000}
            }
        }),
    )
    .await
    .unwrap();

    assert!(response.error.is_none());
    let result = response.result.as_ref().unwrap();
    assert_eq!(result["isError"], true);
    assert!(result_text(&response).contains("timeout"));
}

#[tokio::test]
async fn missing_question_argument_is_invalid_params() {
    let server = initialized_server().await;
    let response = send(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": {"name": "alcf_ask_question", "arguments": {}}
        }),
    )
    .await
    .unwrap();
    assert_eq!(response.error.unwrap().code, -32602);
}
