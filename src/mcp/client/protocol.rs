use super::{format_rpc_error, format_unexpected_server_message, McpEndpoint};
use rust_mcp_schema::schema_utils::ServerMessage;
use rust_mcp_schema::{InitializeResult, LATEST_PROTOCOL_VERSION};
use serde_json::Value;

pub(crate) fn requested_protocol_version(endpoint: &McpEndpoint) -> String {
    endpoint
        .protocol_version
        .clone()
        .filter(|version| !version.trim().is_empty())
        .unwrap_or_else(|| LATEST_PROTOCOL_VERSION.to_string())
}

pub(crate) fn effective_protocol_version(
    endpoint: &McpEndpoint,
    negotiated_version: Option<&str>,
) -> String {
    match negotiated_version {
        Some(version) if !version.trim().is_empty() => version.to_string(),
        _ => requested_protocol_version(endpoint),
    }
}

pub(crate) fn parse_initialize_result(message: ServerMessage) -> Result<InitializeResult, String> {
    let value = parse_response_value(message)?;
    let result =
        serde_json::from_value::<InitializeResult>(value).map_err(|err| err.to_string())?;
    if result.protocol_version.trim().is_empty() {
        return Err("Unexpected initialize response.".to_string());
    }
    Ok(result)
}

pub(crate) fn parse_response_value(message: ServerMessage) -> Result<Value, String> {
    match message {
        ServerMessage::Response(response) => {
            serde_json::to_value(&response.result).map_err(|err| err.to_string())
        }
        ServerMessage::Error(error) => Err(format_rpc_error(&error.error)),
        other => Err(format_unexpected_server_message(&other)),
    }
}
