//! MCP server loop.
//!
//! Wraps a `ToolRegistry` and answers `initialize`, `tools/list`, and
//! `tools/call` over a transport. Every failure mode -- unparseable input,
//! unknown methods, missing tools, failing tool executions -- becomes a
//! response on the wire; only a closed transport ends the loop.

use serde_json::Value;

use crate::error::McpError;
use crate::tool::ToolRegistry;
use crate::transport::McpTransport;
use crate::types::*;

/// MCP server bridging a `ToolRegistry` to a client.
pub struct McpServer {
    registry: ToolRegistry,
    server_name: String,
    server_version: String,
}

impl McpServer {
    /// Create a new MCP server wrapping the given tool registry.
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            server_name: "docvec".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Set the advertised server name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    /// Run the server loop until the transport closes.
    pub async fn run<T: McpTransport>(&mut self, transport: &mut T) -> Result<(), McpError> {
        tracing::info!(server = %self.server_name, "MCP server starting");

        loop {
            let line = match transport.receive().await? {
                Some(line) => line,
                None => {
                    tracing::info!("Transport closed, shutting down");
                    break;
                }
            };

            tracing::debug!(message = %line, "Received message");

            // Requests carry an "id"; notifications don't. Parse as a
            // generic Value first to tell them apart.
            let raw: Value = match serde_json::from_str(&line) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse JSON");
                    let err = McpError::JsonParse(e).to_rpc_error();
                    let resp = JsonRpcResponse::error(RpcId::Number(0), err.code, err.message);
                    transport.send(&serde_json::to_string(&resp)?).await?;
                    continue;
                }
            };

            if raw.get("id").is_none() {
                if let Ok(notif) = serde_json::from_value::<JsonRpcNotification>(raw) {
                    self.handle_notification(&notif);
                }
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_value(raw) {
                Ok(req) => req,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse JSON-RPC request");
                    let resp = JsonRpcResponse::error(
                        RpcId::Number(0),
                        error_codes::INVALID_REQUEST,
                        e.to_string(),
                    );
                    transport.send(&serde_json::to_string(&resp)?).await?;
                    continue;
                }
            };

            let response = self.handle_request(&request).await;
            let json = serde_json::to_string(&response)?;
            tracing::debug!(response = %json, "Sending response");
            transport.send(&json).await?;
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request and produce a response.
    pub async fn handle_request(&mut self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, &request.params).await,
            method => {
                tracing::warn!(method = %method, "Unknown method");
                let err = McpError::MethodNotFound(method.to_string());
                JsonRpcResponse::error(id, err.to_rpc_error().code, err.to_string())
            }
        }
    }

    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" => {
                tracing::info!("Client confirmed initialization");
            }
            "notifications/cancelled" => {
                tracing::debug!("Client cancelled a request");
            }
            method => {
                tracing::debug!(method = %method, "Unknown notification, ignoring");
            }
        }
    }

    fn handle_initialize(&mut self, id: RpcId) -> JsonRpcResponse {
        tracing::info!("Handling initialize");

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: self.server_name.clone(),
                version: Some(self.server_version.clone()),
            },
        };

        json_response(id, result)
    }

    fn handle_list_tools(&self, id: RpcId) -> JsonRpcResponse {
        tracing::debug!("Handling tools/list");

        let tools: Vec<ToolInfo> = self
            .registry
            .list()
            .into_iter()
            .map(ToolInfo::from)
            .collect();
        json_response(id, ListToolsResult { tools })
    }

    async fn handle_call_tool(&self, id: RpcId, params: &Option<Value>) -> JsonRpcResponse {
        let params = match params {
            Some(p) => p,
            None => {
                let err = McpError::InvalidParams("missing params".to_string());
                return JsonRpcResponse::error(id, err.to_rpc_error().code, err.to_string());
            }
        };

        let call_params: CallToolParams = match serde_json::from_value(params.clone()) {
            Ok(p) => p,
            Err(e) => {
                let err = McpError::InvalidParams(e.to_string());
                return JsonRpcResponse::error(id, err.to_rpc_error().code, err.to_string());
            }
        };

        tracing::debug!(tool = %call_params.name, "Handling tools/call");

        let tool = match self.registry.get(&call_params.name) {
            Some(t) => t,
            None => {
                let err = McpError::ToolNotFound(call_params.name.clone());
                return JsonRpcResponse::error(id, err.to_rpc_error().code, err.to_string());
            }
        };

        // A failing tool is an inline result, not a dead session.
        let result = match tool.execute(call_params.arguments).await {
            Ok(output) => CallToolResult {
                content: vec![ToolContent::Text {
                    text: output.content,
                }],
                is_error: output.is_error,
            },
            Err(e) => CallToolResult {
                content: vec![ToolContent::Text {
                    text: e.to_string(),
                }],
                is_error: true,
            },
        };

        json_response(id, result)
    }
}

fn json_response<T: serde::Serialize>(id: RpcId, result: T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(val) => JsonRpcResponse::success(id, val),
        Err(e) => {
            let err = McpError::JsonParse(e);
            JsonRpcResponse::error(id, err.to_rpc_error().code, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{EchoTool, Tool, ToolDefinition, ToolError, ToolOutput};
    use crate::transport::ChannelTransport;
    use async_trait::async_trait;

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "flaky".to_string(),
                description: "Always fails.".to_string(),
                input_schema: serde_json::json!({"type": "object"}),
            }
        }

        async fn execute(&self, _arguments: Value) -> Result<ToolOutput, ToolError> {
            Err(ToolError::ExecutionFailed("backend unavailable".into()))
        }
    }

    fn test_registry() -> ToolRegistry {
        let mut reg = ToolRegistry::new();
        reg.register(EchoTool).unwrap();
        reg.register(FailingTool).unwrap();
        reg
    }

    #[tokio::test]
    async fn initialize_advertises_tools() {
        let mut server = McpServer::new(test_registry()).with_name("docvec-test");
        let req = JsonRpcRequest::new(
            RpcId::Number(1),
            "initialize",
            Some(serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {"name": "test-client"}
            })),
        );

        let resp = server.handle_request(&req).await;
        assert!(resp.error.is_none());
        let result: InitializeResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.protocol_version, PROTOCOL_VERSION);
        assert_eq!(result.server_info.name, "docvec-test");
        assert!(result.capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn list_tools_returns_definitions() {
        let mut server = McpServer::new(test_registry());
        let req = JsonRpcRequest::new(RpcId::Number(2), "tools/list", None);

        let resp = server.handle_request(&req).await;
        let result: ListToolsResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.tools.len(), 2);
        assert!(result.tools.iter().any(|t| t.name == "echo"));
    }

    #[tokio::test]
    async fn call_tool_returns_content() {
        let mut server = McpServer::new(test_registry());
        let req = JsonRpcRequest::new(
            RpcId::Number(3),
            "tools/call",
            Some(serde_json::json!({
                "name": "echo",
                "arguments": {"message": "hello mcp"}
            })),
        );

        let resp = server.handle_request(&req).await;
        assert!(resp.error.is_none());
        let result: CallToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert!(!result.is_error);
        match &result.content[0] {
            ToolContent::Text { text } => assert_eq!(text, "hello mcp"),
        }
    }

    #[tokio::test]
    async fn failing_tool_yields_inline_error_not_rpc_error() {
        let mut server = McpServer::new(test_registry());
        let req = JsonRpcRequest::new(
            RpcId::Number(4),
            "tools/call",
            Some(serde_json::json!({"name": "flaky", "arguments": {}})),
        );

        let resp = server.handle_request(&req).await;
        assert!(resp.error.is_none(), "tool failure must stay inline");
        let result: CallToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert!(result.is_error);
        match &result.content[0] {
            ToolContent::Text { text } => assert!(text.contains("backend unavailable")),
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let mut server = McpServer::new(test_registry());
        let req = JsonRpcRequest::new(
            RpcId::Number(5),
            "tools/call",
            Some(serde_json::json!({"name": "nonexistent", "arguments": {}})),
        );

        let resp = server.handle_request(&req).await;
        assert_eq!(resp.error.unwrap().code, error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let mut server = McpServer::new(test_registry());
        let req = JsonRpcRequest::new(RpcId::Number(6), "unknown/method", None);

        let resp = server.handle_request(&req).await;
        assert_eq!(resp.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn run_loop_over_channel_transport() {
        let (mut client, mut server_side) = ChannelTransport::pair();
        let mut server = McpServer::new(test_registry());

        let handle = tokio::spawn(async move { server.run(&mut server_side).await });

        let init = JsonRpcRequest::new(
            RpcId::Number(1),
            "initialize",
            Some(serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {"name": "test"}
            })),
        );
        client.send(&serde_json::to_string(&init).unwrap()).await.unwrap();
        let resp: JsonRpcResponse =
            serde_json::from_str(&client.receive().await.unwrap().unwrap()).unwrap();
        assert!(resp.error.is_none());

        // Garbage input gets an error response and the loop survives.
        client.send("this is not json").await.unwrap();
        let resp: JsonRpcResponse =
            serde_json::from_str(&client.receive().await.unwrap().unwrap()).unwrap();
        assert_eq!(resp.error.unwrap().code, error_codes::PARSE_ERROR);

        let call = JsonRpcRequest::new(
            RpcId::Number(2),
            "tools/call",
            Some(serde_json::json!({
                "name": "echo",
                "arguments": {"message": "still alive"}
            })),
        );
        client.send(&serde_json::to_string(&call).unwrap()).await.unwrap();
        let resp: JsonRpcResponse =
            serde_json::from_str(&client.receive().await.unwrap().unwrap()).unwrap();
        let result: CallToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        match &result.content[0] {
            ToolContent::Text { text } => assert_eq!(text, "still alive"),
        }

        drop(client);
        handle.await.unwrap().unwrap();
    }
}
