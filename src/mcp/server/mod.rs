//! The bridge's own MCP server, `copilot-spaces-mcp`.
//!
//! [`McpServer`] handles one JSON-RPC message at a time and is shared by the
//! stdio and SSE transports.

use crate::core::space_chat::SpaceChat;
use rust_mcp_schema::{
    Implementation, InitializeResult, ServerCapabilities, ServerCapabilitiesResources,
    ServerCapabilitiesTools, LATEST_PROTOCOL_VERSION,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

pub mod sse;
pub mod stdio;
pub mod tools;

pub const SERVER_NAME: &str = "copilot-spaces-mcp";
pub const SERVER_INSTRUCTIONS: &str = "MCP server to interact with GitHub Copilot Spaces. \
    Use list_spaces to discover available spaces, then query_space to chat with them.";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn from_outcome(id: Value, outcome: Result<Value, JsonRpcError>) -> Self {
        let (result, error) = match outcome {
            Ok(result) => (Some(result), None),
            Err(error) => (None, Some(error)),
        };
        Self {
            jsonrpc: "2.0",
            id,
            result,
            error,
        }
    }
}

pub struct McpServer {
    chat: Arc<SpaceChat>,
}

impl McpServer {
    pub fn new(chat: Arc<SpaceChat>) -> Self {
        Self { chat }
    }

    /// Handles one raw JSON-RPC message; `None` when nothing is to be sent
    /// back.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "Unparseable MCP message");
                return Some(JsonRpcResponse::from_outcome(
                    Value::Null,
                    Err(JsonRpcError::new(PARSE_ERROR, format!("Parse error: {err}"))),
                ));
            }
        };

        // Replies to server-initiated requests; this server never sends any.
        if value.get("method").is_none()
            && (value.get("result").is_some() || value.get("error").is_some())
        {
            return None;
        }

        match serde_json::from_value::<JsonRpcRequest>(value.clone()) {
            Ok(request) => self.handle(request).await,
            Err(err) => Some(JsonRpcResponse::from_outcome(
                value.get("id").cloned().unwrap_or(Value::Null),
                Err(JsonRpcError::new(
                    INVALID_REQUEST,
                    format!("Invalid request: {err}"),
                )),
            )),
        }
    }

    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "MCP notification");
            return None;
        };
        let outcome = self
            .dispatch(&request.method, request.params.unwrap_or(Value::Null))
            .await;
        Some(JsonRpcResponse::from_outcome(id, outcome))
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, JsonRpcError> {
        debug!(method, "MCP request");
        match method {
            "initialize" => initialize_result(&params),
            "ping" => Ok(json!({})),
            "tools/list" => tools::list_tools(),
            "tools/call" => tools::call_tool(&self.chat, params).await,
            "resources/list" => tools::list_resources(),
            "resources/read" => tools::read_resource(&self.chat, params).await,
            other => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        }
    }
}

/// Echoes the client's protocol version, or offers the latest one.
fn initialize_result(params: &Value) -> Result<Value, JsonRpcError> {
    let protocol_version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .filter(|version| !version.trim().is_empty())
        .unwrap_or(LATEST_PROTOCOL_VERSION)
        .to_string();

    let mut capabilities = ServerCapabilities::default();
    capabilities.tools = Some(ServerCapabilitiesTools::default());
    capabilities.resources = Some(ServerCapabilitiesResources::default());

    let result = InitializeResult {
        capabilities,
        instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        meta: None,
        protocol_version,
        server_info: Implementation {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: None,
            description: None,
            icons: Vec::new(),
            website_url: None,
        },
    };
    serde_json::to_value(result).map_err(|err| JsonRpcError::internal(err.to_string()))
}
