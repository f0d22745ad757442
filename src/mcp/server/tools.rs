//! Tools and resources offered by the bridge's MCP server.
//!
//! Tool failures are reported inside a successful result as an
//! `{"error": message}` text payload; only malformed calls become JSON-RPC
//! errors.

use super::JsonRpcError;
use crate::core::space_chat::SpaceChat;
use crate::error::BridgeError;
use rust_mcp_schema::{ListResourcesResult, ListToolsResult, Resource, Tool, ToolInputSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::error;

pub const TOOL_LIST_SPACES: &str = "list_spaces";
pub const TOOL_QUERY_SPACE: &str = "query_space";
pub const SPACES_RESOURCE_URI: &str = "spaces://list";

const JSON_MIME_TYPE: &str = "application/json";

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct QuerySpaceArgs {
    space_id: String,
    prompt: String,
    #[serde(default = "empty_history")]
    conversation_history: String,
}

fn empty_history() -> String {
    "[]".to_string()
}

#[derive(Debug, Deserialize)]
struct ReadResourceParams {
    uri: String,
}

pub fn list_tools() -> Result<Value, JsonRpcError> {
    let tools = vec![
        tool(
            TOOL_LIST_SPACES,
            "List all available GitHub Copilot Spaces for the authenticated user. \
             Returns a JSON array of space objects.",
            json!({"type": "object", "properties": {}}),
        )?,
        tool(
            TOOL_QUERY_SPACE,
            "Send a prompt to a GitHub Copilot Space and get a response.",
            json!({
                "type": "object",
                "properties": {
                    "space_id": {
                        "type": "string",
                        "description": "The owner/name reference of the Copilot Space to query"
                    },
                    "prompt": {
                        "type": "string",
                        "description": "The user's message"
                    },
                    "conversation_history": {
                        "type": "string",
                        "description": "JSON array of previous messages [{\"role\":\"...\",\"content\":\"...\"}]",
                        "default": "[]"
                    }
                },
                "required": ["space_id", "prompt"]
            }),
        )?,
    ];

    to_result(ListToolsResult {
        meta: None,
        next_cursor: None,
        tools,
    })
}

fn tool(name: &str, description: &str, schema: Value) -> Result<Tool, JsonRpcError> {
    let input_schema: ToolInputSchema = serde_json::from_value(schema)
        .map_err(|err| JsonRpcError::internal(format!("Invalid schema for {name}: {err}")))?;
    Ok(Tool {
        annotations: None,
        description: Some(description.to_string()),
        execution: None,
        icons: Vec::new(),
        input_schema,
        meta: None,
        name: name.to_string(),
        output_schema: None,
        title: None,
    })
}

pub async fn call_tool(chat: &SpaceChat, params: Value) -> Result<Value, JsonRpcError> {
    let params: CallToolParams = serde_json::from_value(params)
        .map_err(|err| JsonRpcError::invalid_params(format!("Invalid tools/call params: {err}")))?;
    let arguments = Value::Object(params.arguments.unwrap_or_default());

    let text = match params.name.as_str() {
        TOOL_LIST_SPACES => match chat.upstream().list_spaces().await {
            Ok(spaces) => pretty_json(&spaces),
            Err(err) => {
                error!(error = %err, "list_spaces tool failed");
                error_text(&err)
            }
        },
        TOOL_QUERY_SPACE => {
            let args: QuerySpaceArgs = serde_json::from_value(arguments).map_err(|err| {
                JsonRpcError::invalid_params(format!("Invalid arguments for {TOOL_QUERY_SPACE}: {err}"))
            })?;
            match chat
                .ask_with_history(&args.space_id, &args.prompt, &args.conversation_history)
                .await
            {
                Ok(reply) => compact_json(&reply),
                Err(err) => {
                    error!(space_ref = %args.space_id, error = %err, "query_space tool failed");
                    error_text(&err)
                }
            }
        }
        other => {
            return Err(JsonRpcError::invalid_params(format!("Unknown tool: {other}")));
        }
    };

    Ok(json!({
        "content": [{"type": "text", "text": text}],
        "isError": false
    }))
}

pub fn list_resources() -> Result<Value, JsonRpcError> {
    let resource: Resource = serde_json::from_value(json!({
        "uri": SPACES_RESOURCE_URI,
        "name": "spaces",
        "description": "Resource exposing available Copilot Spaces.",
        "mimeType": JSON_MIME_TYPE
    }))
    .map_err(|err| JsonRpcError::internal(err.to_string()))?;

    to_result(ListResourcesResult {
        meta: None,
        next_cursor: None,
        resources: vec![resource],
    })
}

/// Unlike the tools, a failed listing here is a JSON-RPC error.
pub async fn read_resource(chat: &SpaceChat, params: Value) -> Result<Value, JsonRpcError> {
    let params: ReadResourceParams = serde_json::from_value(params).map_err(|err| {
        JsonRpcError::invalid_params(format!("Invalid resources/read params: {err}"))
    })?;
    if params.uri != SPACES_RESOURCE_URI {
        return Err(JsonRpcError::invalid_params(format!(
            "Unknown resource: {}",
            params.uri
        )));
    }

    let spaces = chat.upstream().list_spaces().await.map_err(|err| {
        error!(error = %err, "spaces resource read failed");
        JsonRpcError::internal(err.to_string())
    })?;
    Ok(json!({
        "contents": [{
            "uri": SPACES_RESOURCE_URI,
            "mimeType": JSON_MIME_TYPE,
            "text": pretty_json(&spaces)
        }]
    }))
}

fn to_result<T: Serialize>(result: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(result).map_err(|err| JsonRpcError::internal(err.to_string()))
}

fn pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| error_message_text(&err.to_string()))
}

fn compact_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| error_message_text(&err.to_string()))
}

fn error_text(err: &BridgeError) -> String {
    error_message_text(&err.to_string())
}

fn error_message_text(message: &str) -> String {
    json!({ "error": message }).to_string()
}
