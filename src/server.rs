//! MCP server implementation.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;

use crate::config::QueryConfig;
use crate::error::{codes, Result};
use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcId, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, McpMessage, ServerCapabilities, ServerInfo, ToolCallParams, ToolsCapability,
};
use crate::tools::ToolRegistry;

/// MCP protocol version.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name.
pub const SERVER_NAME: &str = "askalcf";

/// Server version.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialization.
    Uninitialized,
    /// Server is initialized and ready.
    Ready,
    /// Server is shutting down.
    ShuttingDown,
}

/// MCP server exposing the AskALCF query tools over stdio.
pub struct McpServer {
    state: Arc<RwLock<ServerState>>,
    tools: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a new MCP server with default query timing.
    pub fn new() -> Self {
        Self::with_config(QueryConfig::default())
    }

    /// Create a new MCP server with custom query timing.
    pub fn with_config(config: QueryConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(ServerState::Uninitialized)),
            tools: Arc::new(ToolRegistry::new(config)),
        }
    }

    /// Run the server on stdio.
    pub async fn run_stdio(&self) -> Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(stdin).lines();

        tracing::info!("MCP server starting on stdio");

        while let Some(line) = lines.next_line().await? {
            if line.is_empty() {
                continue;
            }

            tracing::debug!("Received: {}", line);

            let response = self.handle_message(&line).await;

            if let Some(response) = response {
                let json = serde_json::to_string(&response)?;
                tracing::debug!("Sending: {}", json);
                stdout.write_all(json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }

            // Check if we should exit
            if *self.state.read().await == ServerState::ShuttingDown {
                break;
            }
        }

        tracing::info!("MCP server shutting down");
        Ok(())
    }

    /// Handle an incoming message.
    pub async fn handle_message(&self, json: &str) -> Option<JsonRpcResponse> {
        match McpMessage::parse(json) {
            Ok(McpMessage::Request(request)) => Some(self.handle_request(request).await),
            Ok(McpMessage::Notification(notification)) => {
                self.handle_notification(notification).await;
                None
            }
            Ok(McpMessage::Response(_)) => {
                // We don't expect responses in this direction
                None
            }
            Err(e) => Some(JsonRpcResponse::error(
                None,
                codes::PARSE_ERROR,
                e.to_string(),
            )),
        }
    }

    /// Handle a JSON-RPC request.
    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params).await,
            "tools/list" => self.handle_tools_list(id).await,
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "shutdown" => {
                *self.state.write().await = ServerState::ShuttingDown;
                JsonRpcResponse::success(id, serde_json::json!({}))
            }
            _ => JsonRpcResponse::error(
                id,
                codes::METHOD_NOT_FOUND,
                format!("method not found: {}", request.method),
            ),
        }
    }

    /// Handle a notification (no response expected).
    async fn handle_notification(&self, notification: JsonRpcRequest) {
        match notification.method.as_str() {
            "notifications/initialized" => {
                tracing::info!("Client initialized");
            }
            "notifications/cancelled" => {
                tracing::debug!("Request cancelled by client");
            }
            "exit" => {
                *self.state.write().await = ServerState::ShuttingDown;
            }
            _ => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    /// Handle initialize request.
    async fn handle_initialize(
        &self,
        id: Option<JsonRpcId>,
        params: Option<serde_json::Value>,
    ) -> JsonRpcResponse {
        let _params: InitializeParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        codes::INVALID_PARAMS,
                        format!("invalid initialize params: {}", e),
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(
                    id,
                    codes::INVALID_PARAMS,
                    "initialize params required",
                );
            }
        };

        *self.state.write().await = ServerState::Ready;

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.into(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.into(),
                version: SERVER_VERSION.into(),
            },
        };

        JsonRpcResponse::success(id, result)
    }

    /// Handle tools/list request.
    async fn handle_tools_list(&self, id: Option<JsonRpcId>) -> JsonRpcResponse {
        let state = *self.state.read().await;
        if state != ServerState::Ready {
            return JsonRpcResponse::error(id, codes::INTERNAL_ERROR, "server not initialized");
        }

        let tools = self.tools.list_tools();
        let result = ListToolsResult { tools };

        JsonRpcResponse::success(id, result)
    }

    /// Handle tools/call request.
    async fn handle_tools_call(
        &self,
        id: Option<JsonRpcId>,
        params: Option<serde_json::Value>,
    ) -> JsonRpcResponse {
        let state = *self.state.read().await;
        if state != ServerState::Ready {
            return JsonRpcResponse::error(id, codes::INTERNAL_ERROR, "server not initialized");
        }

        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        codes::INVALID_PARAMS,
                        format!("invalid tool call params: {}", e),
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(
                    id,
                    codes::INVALID_PARAMS,
                    "tool call params required",
                );
            }
        };

        match self.tools.execute(&params.name, params.arguments).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                tracing::error!("Tool {} failed: {}", params.name, e);
                JsonRpcResponse::error(id, e.code(), e.to_string())
            }
        }
    }
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}
