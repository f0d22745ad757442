//! In-process HTTP responders for exercising the upstream clients.

use crate::api::ChatMessage;
use crate::error::BridgeError;
use crate::spaces::{Space, SpacesUpstream};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    /// JSON-RPC method of the body, if any.
    pub fn rpc_method(&self) -> Option<String> {
        self.json()
            .get("method")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn rpc_id(&self) -> Value {
        self.json().get("id").cloned().unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MockResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
    delay: Option<Duration>,
}

impl MockResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: body.to_string(),
            delay: None,
        }
    }

    /// A single-event `text/event-stream` response.
    pub fn sse(message: Value) -> Self {
        Self {
            status: 200,
            headers: vec![(
                "content-type".to_string(),
                "text/event-stream; charset=utf-8".to_string(),
            )],
            body: format!("event: message\ndata: {message}\n\n"),
            delay: None,
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
            delay: None,
        }
    }

    /// Holds the response back for `delay` before writing it.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn to_http(&self) -> String {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status, reason_phrase(self.status));
        for (name, value) in &self.headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        head.push_str("connection: close\r\n");
        head.push_str(&format!("content-length: {}\r\n\r\n", self.body.len()));
        head.push_str(&self.body);
        head
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        202 => "Accepted",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "Status",
    }
}

pub(crate) struct MockServer {
    pub url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    task: JoinHandle<()>,
}

impl MockServer {
    pub async fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().await.clone()
    }

    /// Requests whose JSON-RPC method matches `method`.
    pub async fn rpc_requests(&self, method: &str) -> Vec<CapturedRequest> {
        self.requests()
            .await
            .into_iter()
            .filter(|request| request.rpc_method().as_deref() == Some(method))
            .collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Serves one request per connection with `handler` until dropped.
pub(crate) async fn spawn_mock_server<F>(handler: F) -> MockServer
where
    F: Fn(&CapturedRequest) -> MockResponse + Send + Sync + 'static,
{
    disable_proxies();
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");
    let captured = Arc::new(Mutex::new(Vec::new()));
    let captured_for_server = Arc::clone(&captured);

    let task = tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let Ok(request) = read_http_request(&mut stream).await else {
                continue;
            };
            let response = handler(&request);
            captured_for_server.lock().await.push(request);
            if let Some(delay) = response.delay {
                tokio::time::sleep(delay).await;
            }
            let _ = stream.write_all(response.to_http().as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    MockServer {
        url: format!("http://{addr}/mcp"),
        captured,
        task,
    }
}

/// Answers the MCP handshake, replies to `tools/call` with `tool_result` over
/// an event stream, and answers session teardown with `delete_status`.
pub(crate) fn spaces_mcp_handler(
    tool_result: Value,
    delete_status: u16,
) -> impl Fn(&CapturedRequest) -> MockResponse + Send + Sync + 'static {
    move |request| {
        if request.method == "DELETE" {
            return MockResponse::empty(delete_status);
        }
        match request.rpc_method().as_deref() {
            Some("initialize") => MockResponse::json(
                200,
                json!({
                    "jsonrpc": "2.0",
                    "id": request.rpc_id(),
                    "result": {
                        "protocolVersion": "2025-06-18",
                        "capabilities": {"tools": {}},
                        "serverInfo": {"name": "github-mcp-server", "version": "0.1.0", "icons": []}
                    }
                }),
            )
            .with_header("mcp-session-id", "session-1"),
            Some("notifications/initialized") => MockResponse::empty(202),
            Some("tools/call") => MockResponse::sse(json!({
                "jsonrpc": "2.0",
                "id": request.rpc_id(),
                "result": tool_result.clone()
            })),
            _ => MockResponse::json(
                200,
                json!({
                    "jsonrpc": "2.0",
                    "id": request.rpc_id(),
                    "error": {"code": -32601, "message": "Method not found"}
                }),
            ),
        }
    }
}

pub(crate) fn disable_proxies() {
    std::env::remove_var("HTTP_PROXY");
    std::env::remove_var("http_proxy");
    std::env::remove_var("HTTPS_PROXY");
    std::env::remove_var("https_proxy");
    std::env::remove_var("ALL_PROXY");
    std::env::remove_var("all_proxy");
    std::env::set_var("NO_PROXY", "*");
    std::env::set_var("no_proxy", "*");
}

async fn read_http_request(stream: &mut TcpStream) -> Result<CapturedRequest, String> {
    let mut buffer = Vec::new();
    let mut header_end = None;
    while header_end.is_none() {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        header_end = buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4);
    }

    let header_end = header_end.ok_or_else(|| "header end should exist".to_string())?;
    let header_text = std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines
        .next()
        .ok_or_else(|| "Missing HTTP request line".to_string())?;
    let mut request_parts = request_line.split_whitespace();
    let method = request_parts.next().unwrap_or_default().to_string();
    let path = request_parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    let mut content_length = 0_usize;
    for line in lines {
        let mut parts = line.splitn(2, ':');
        let Some(name) = parts.next() else {
            continue;
        };
        let value = parts.next().unwrap_or_default().trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().map_err(|err| err.to_string())?;
        }
        headers.push((name.to_string(), value));
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = vec![0_u8; content_length.saturating_sub(body.len())];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP body".to_string());
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(CapturedRequest {
        method,
        path,
        headers,
        body,
    })
}

/// A [`SpacesUpstream`] that serves canned data and records every chat call.
pub(crate) struct RecordingUpstream {
    space: Option<Space>,
    spaces: Result<Vec<Value>, String>,
    reply: Value,
    chat_calls: std::sync::Mutex<Vec<Vec<ChatMessage>>>,
    fetches: std::sync::atomic::AtomicUsize,
}

impl RecordingUpstream {
    pub fn new(space: Option<Space>, reply: Value) -> Self {
        Self {
            space,
            spaces: Ok(Vec::new()),
            reply,
            chat_calls: std::sync::Mutex::new(Vec::new()),
            fetches: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn with_spaces(mut self, spaces: Result<Vec<Value>, String>) -> Self {
        self.spaces = spaces;
        self
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.chat_calls.lock().expect("chat calls lock").clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl SpacesUpstream for RecordingUpstream {
    async fn list_spaces(&self) -> Result<Vec<Value>, BridgeError> {
        self.spaces.clone().map_err(BridgeError::mcp)
    }

    async fn get_space(&self, _space_ref: &str) -> Result<Space, BridgeError> {
        self.fetches
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.space
            .clone()
            .ok_or_else(|| BridgeError::mcp("space unavailable"))
    }

    async fn query_chat(
        &self,
        _space_id: &str,
        messages: &[ChatMessage],
    ) -> Result<Value, BridgeError> {
        self.chat_calls
            .lock()
            .expect("chat calls lock")
            .push(messages.to_vec());
        Ok(self.reply.clone())
    }
}
