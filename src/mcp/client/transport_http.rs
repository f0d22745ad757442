use super::{client_details_for, protocol, McpEndpoint};
use crate::mcp::transport::streamable_http::{is_event_stream_content_type, next_sse_server_message};
use crate::mcp::transport::{
    apply_session_headers, apply_streamable_http_client_post_headers,
    apply_streamable_http_protocol_version_header, MCP_SESSION_ID_HEADER,
};
use rust_mcp_schema::schema_utils::{
    ClientMessage, FromMessage, MessageFromClient, NotificationFromClient, RequestFromClient,
    ServerMessage,
};
use rust_mcp_schema::RequestId;
use tracing::debug;

/// State a streamable HTTP exchange reads and updates.
pub(crate) trait StreamableHttpContext {
    fn endpoint(&self) -> &McpEndpoint;
    fn auth_header(&self) -> &str;
    fn session_id(&self) -> Option<&str>;
    fn http_client(&self) -> &reqwest::Client;
    fn set_session_id(&mut self, session_id: Option<String>);
    fn next_request_id(&mut self) -> i64;
    fn negotiated_protocol_version(&self) -> Option<&str>;
    fn set_negotiated_protocol_version(&mut self, protocol_version: Option<String>);

    fn effective_protocol_version(&self) -> String {
        protocol::effective_protocol_version(self.endpoint(), self.negotiated_protocol_version())
    }
}

/// Runs the `initialize` handshake followed by `notifications/initialized`.
///
/// Servers may run stateless and omit the session id; later requests then go
/// out without one.
pub(crate) async fn ensure_session_context<C: StreamableHttpContext>(
    context: &mut C,
) -> Result<(), String> {
    if context.session_id().is_some() {
        return Ok(());
    }

    let client_details = client_details_for(context.endpoint());
    let response = send_request_with_context(
        context,
        RequestFromClient::InitializeRequest(client_details),
    )
    .await?;
    let initialize = protocol::parse_initialize_result(response)?;
    debug!(
        protocol_version = %initialize.protocol_version,
        server = %initialize.server_info.name,
        session = context.session_id().is_some(),
        "MCP session initialized"
    );
    context.set_negotiated_protocol_version(Some(initialize.protocol_version));

    send_notification(
        context,
        NotificationFromClient::InitializedNotification(None),
    )
    .await
}

pub(crate) async fn send_request_with_context<C: StreamableHttpContext>(
    context: &mut C,
    request: RequestFromClient,
) -> Result<ServerMessage, String> {
    let request_id = context.next_request_id();
    let message = ClientMessage::from_message(
        MessageFromClient::RequestFromClient(request),
        Some(RequestId::Integer(request_id)),
    )
    .map_err(|err| err.to_string())?;
    send_message(context, message).await
}

/// Ends the server-side session with `DELETE`.
///
/// Some servers reject the delete (405) or fail it (5xx) even though every
/// preceding exchange succeeded; the caller decides whether that matters.
pub(crate) async fn terminate_session<C: StreamableHttpContext>(
    context: &C,
) -> Result<(), String> {
    let Some(session_id) = context.session_id() else {
        return Ok(());
    };

    let protocol_version = context.effective_protocol_version();
    let request = apply_session_headers(
        apply_streamable_http_protocol_version_header(
            context.http_client().delete(&context.endpoint().url),
            Some(protocol_version.as_str()),
        ),
        context.auth_header(),
        Some(session_id),
    );

    let response = request.send().await.map_err(|err| err.to_string())?;
    if !response.status().is_success() {
        return Err(format!(
            "HTTP error during session teardown: {}",
            response.status()
        ));
    }
    Ok(())
}

async fn send_notification<C: StreamableHttpContext>(
    context: &mut C,
    notification: NotificationFromClient,
) -> Result<(), String> {
    let message = ClientMessage::from_message(
        MessageFromClient::NotificationFromClient(notification),
        None,
    )
    .map_err(|err| err.to_string())?;

    let response = post_client_message(context, &message).await?;
    if !response.status().is_success() {
        return Err(format!("HTTP error: {}", response.status()));
    }
    capture_session_id(context, &response);
    Ok(())
}

async fn post_client_message<C: StreamableHttpContext>(
    context: &C,
    message: &ClientMessage,
) -> Result<reqwest::Response, String> {
    let payload = serde_json::to_string(message).map_err(|err| err.to_string())?;
    let protocol_version = context.effective_protocol_version();
    let request = apply_session_headers(
        apply_streamable_http_protocol_version_header(
            apply_streamable_http_client_post_headers(
                context.http_client().post(&context.endpoint().url),
            ),
            Some(protocol_version.as_str()),
        ),
        context.auth_header(),
        context.session_id(),
    )
    .body(payload);

    request.send().await.map_err(|err| err.to_string())
}

fn capture_session_id<C: StreamableHttpContext>(context: &mut C, response: &reqwest::Response) {
    if let Some(session_id) = response
        .headers()
        .get(MCP_SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
    {
        context.set_session_id(Some(session_id));
    }
}

async fn send_message<C: StreamableHttpContext>(
    context: &mut C,
    message: ClientMessage,
) -> Result<ServerMessage, String> {
    debug!(url = %context.endpoint().url, "Sending MCP HTTP request");
    let response = post_client_message(context, &message).await?;
    if !response.status().is_success() {
        return Err(format!("HTTP error: {}", response.status()));
    }

    capture_session_id(context, &response);
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    if is_event_stream_content_type(&content_type) {
        next_sse_server_message(response).await
    } else {
        let body = response.bytes().await.map_err(|err| err.to_string())?;
        serde_json::from_slice::<ServerMessage>(&body).map_err(|err| err.to_string())
    }
}
