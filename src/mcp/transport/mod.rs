//! Streamable HTTP plumbing shared by the MCP client.

pub mod streamable_http;

pub const MCP_JSON_CONTENT_TYPE: &str = "application/json";
pub const MCP_JSON_AND_SSE_ACCEPT: &str = "application/json, text/event-stream";
pub const MCP_PROTOCOL_VERSION_HEADER: &str = "MCP-Protocol-Version";
pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

pub fn apply_streamable_http_client_post_headers(
    request: reqwest::RequestBuilder,
) -> reqwest::RequestBuilder {
    request
        .header("Content-Type", MCP_JSON_CONTENT_TYPE)
        .header("Accept", MCP_JSON_AND_SSE_ACCEPT)
}

pub fn apply_streamable_http_protocol_version_header(
    request: reqwest::RequestBuilder,
    protocol_version: Option<&str>,
) -> reqwest::RequestBuilder {
    match protocol_version {
        Some(protocol_version) if !protocol_version.trim().is_empty() => {
            request.header(MCP_PROTOCOL_VERSION_HEADER, protocol_version)
        }
        _ => request,
    }
}

/// Attaches the bearer credential and, once negotiated, the session id.
pub fn apply_session_headers(
    request: reqwest::RequestBuilder,
    auth_header: &str,
    session_id: Option<&str>,
) -> reqwest::RequestBuilder {
    let request = request.header("Authorization", auth_header);
    match session_id {
        Some(session_id) => request.header(MCP_SESSION_ID_HEADER, session_id),
        None => request,
    }
}
