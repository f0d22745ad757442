//! Short-lived MCP client sessions over streamable HTTP.
//!
//! Every upstream operation opens its own [`McpSession`], issues its tool call,
//! and tears the session down again; nothing is pooled between calls.

use rust_mcp_schema::schema_utils::{RequestFromClient, ServerMessage};
use rust_mcp_schema::{
    CallToolRequestParams, ClientCapabilities, Implementation, InitializeRequestParams, RpcError,
};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

mod protocol;
mod transport_http;


use transport_http::StreamableHttpContext;

const MCP_HTTP_CONNECT_TIMEOUT_SECONDS: u64 = 10;
const MCP_HTTP_REQUEST_TIMEOUT_SECONDS: u64 = 60;

pub fn build_mcp_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(MCP_HTTP_CONNECT_TIMEOUT_SECONDS))
        .timeout(Duration::from_secs(MCP_HTTP_REQUEST_TIMEOUT_SECONDS))
        .build()
}

/// Where and how to reach the remote MCP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpEndpoint {
    pub url: String,
    /// Requested protocol version; the latest supported one when unset.
    pub protocol_version: Option<String>,
}

impl McpEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            protocol_version: None,
        }
    }
}

/// An initialized session against one MCP endpoint.
///
/// Obtain one with [`McpSession::open`] and always finish with
/// [`McpSession::close`]; the two together bracket a single upstream call.
pub struct McpSession {
    endpoint: McpEndpoint,
    http_client: reqwest::Client,
    auth_header: String,
    session_id: Option<String>,
    negotiated_protocol_version: Option<String>,
    request_id: i64,
}

impl McpSession {
    /// Performs the initialize handshake.
    ///
    /// If the handshake fails after the server already assigned a session, the
    /// session is torn down before the error is returned.
    pub async fn open(
        endpoint: McpEndpoint,
        http_client: reqwest::Client,
        auth_header: String,
    ) -> Result<Self, String> {
        let mut session = Self {
            endpoint,
            http_client,
            auth_header,
            session_id: None,
            negotiated_protocol_version: None,
            request_id: 0,
        };

        if let Err(err) = transport_http::ensure_session_context(&mut session).await {
            if let Err(teardown) = session.close().await {
                debug!(error = %teardown, "MCP session teardown after failed handshake also failed");
            }
            return Err(err);
        }
        Ok(session)
    }

    /// Invokes `tools/call` and returns the raw `result` object.
    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, String> {
        let params = CallToolRequestParams::new(name).with_arguments(arguments);
        let response = transport_http::send_request_with_context(
            self,
            RequestFromClient::CallToolRequest(params),
        )
        .await?;
        protocol::parse_response_value(response)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Ends the session on the server.
    pub async fn close(self) -> Result<(), String> {
        transport_http::terminate_session(&self).await
    }
}

impl StreamableHttpContext for McpSession {
    fn endpoint(&self) -> &McpEndpoint {
        &self.endpoint
    }

    fn auth_header(&self) -> &str {
        &self.auth_header
    }

    fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    fn set_session_id(&mut self, session_id: Option<String>) {
        self.session_id = session_id;
    }

    fn next_request_id(&mut self) -> i64 {
        let id = self.request_id;
        self.request_id += 1;
        id
    }

    fn negotiated_protocol_version(&self) -> Option<&str> {
        self.negotiated_protocol_version.as_deref()
    }

    fn set_negotiated_protocol_version(&mut self, protocol_version: Option<String>) {
        self.negotiated_protocol_version = protocol_version;
    }
}

fn client_details_for(endpoint: &McpEndpoint) -> InitializeRequestParams {
    InitializeRequestParams {
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: Some("Copilot Spaces Bridge".to_string()),
            description: Some("Bridge client for GitHub Copilot Spaces".to_string()),
            icons: Vec::new(),
            website_url: None,
        },
        meta: None,
        protocol_version: protocol::requested_protocol_version(endpoint),
    }
}

fn format_unexpected_server_message(message: &ServerMessage) -> String {
    format!("Unexpected MCP server message: {message:?}")
}

fn format_rpc_error(error: &RpcError) -> String {
    let mut output = format!("MCP error {}: {}", error.code, error.message);
    if let Some(data) = &error.data {
        let details = data
            .get("details")
            .and_then(|value| value.as_str())
            .map(|value| value.to_string())
            .or_else(|| data.as_str().map(|value| value.to_string()))
            .or_else(|| serde_json::to_string_pretty(data).ok());

        if let Some(details) = details {
            if !details.is_empty() {
                output.push('\n');
                output.push_str(&details);
            }
        }
    }
    output
}
