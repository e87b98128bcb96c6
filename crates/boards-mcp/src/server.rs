//! MCP server implementation.
//!
//! The server handles the MCP protocol lifecycle:
//! 1. Initialize - exchange capabilities
//! 2. Handle tool calls - execute tools via the work item provider
//! 3. Shutdown - stop at end of input
//!
//! Requests are handled one at a time, in arrival order.

use std::sync::Arc;

use boards_core::WorkItemProvider;
use serde_json::Value;

use crate::handlers::ToolHandler;
use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId,
    ServerCapabilities, ServerInfo, ToolCallParams, ToolsCapability, ToolsListResult, MCP_VERSION,
};
use crate::transport::{IncomingMessage, StdioTransport};

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "boards-mcp";

/// MCP server exposing Azure Boards tools.
pub struct McpServer {
    handler: ToolHandler,
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server backed by `provider`.
    pub fn new(provider: Arc<dyn WorkItemProvider>) -> Self {
        Self {
            handler: ToolHandler::new(provider),
            initialized: false,
        }
    }

    /// Run the MCP server on stdin/stdout.
    pub async fn run(&mut self) -> boards_core::Result<()> {
        self.run_with_transport(StdioTransport::stdio()).await
    }

    /// Run the MCP server main loop until the transport reaches end of input.
    pub async fn run_with_transport(
        &mut self,
        mut transport: StdioTransport,
    ) -> boards_core::Result<()> {
        tracing::info!(
            provider = self.handler.provider_name(),
            tools = self.handler.available_tools().len(),
            "Starting MCP server"
        );

        loop {
            match transport.read_message() {
                Ok(Some(msg)) => {
                    if let Some(resp) = self.handle_message(msg).await {
                        if let Err(e) = transport.write_response(&resp) {
                            tracing::error!(error = %e, "Failed to write response");
                            break;
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!("EOF received, shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Transport error");
                    let error_resp = JsonRpcResponse::error(
                        RequestId::Null,
                        JsonRpcError::parse_error(&e.to_string()),
                    );
                    if let Err(e) = transport.write_response(&error_resp) {
                        tracing::error!(error = %e, "Failed to write response");
                        break;
                    }
                }
            }
        }

        tracing::info!("MCP server stopped");
        Ok(())
    }

    /// Handle an incoming message.
    async fn handle_message(&mut self, msg: IncomingMessage) -> Option<JsonRpcResponse> {
        match msg {
            IncomingMessage::Request(req) => Some(self.handle_request(req).await),
            IncomingMessage::Notification(notif) => {
                self.handle_notification(&notif.method);
                None
            }
            IncomingMessage::Empty => None,
        }
    }

    /// Handle a JSON-RPC request.
    async fn handle_request(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!(method = %req.method, id = ?req.id, "Handling request");

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req.id, req.params),
            "tools/list" => self.handle_tools_list(req.id),
            "tools/call" => self.handle_tools_call(req.id, req.params).await,
            "ping" => JsonRpcResponse::success(req.id, serde_json::json!({})),
            method => {
                tracing::warn!(method, "Unknown method");
                JsonRpcResponse::error(req.id, JsonRpcError::method_not_found(method))
            }
        }
    }

    /// Handle notifications (no response).
    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => {
                tracing::info!("Client initialized");
            }
            "notifications/cancelled" => {
                tracing::debug!("Request cancelled by client");
            }
            _ => {
                tracing::debug!(method, "Ignoring notification");
            }
        }
    }

    /// Handle initialize request.
    fn handle_initialize(&mut self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        if self.initialized {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("Server already initialized"),
            );
        }

        if let Some(params) = params {
            match serde_json::from_value::<InitializeParams>(params) {
                Ok(init_params) => {
                    tracing::info!(
                        client = %init_params.client_info.name,
                        version = %init_params.client_info.version,
                        protocol = %init_params.protocol_version,
                        "Client connected"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse initialize params");
                }
            }
        }

        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        JsonRpcResponse::from_result(id, &result)
    }

    /// Handle tools/list request.
    fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.handler.available_tools(),
        };
        JsonRpcResponse::from_result(id, &result)
    }

    /// Handle tools/call request.
    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(&e.to_string()),
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
            }
        };

        tracing::info!(tool = %params.name, "Calling tool");

        let result = self.handler.execute(&params.name, params.arguments).await;
        JsonRpcResponse::from_result(id, &result)
    }
}
