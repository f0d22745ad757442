use futures_util::StreamExt;
use memchr::memchr;
use rust_mcp_schema::schema_utils::ServerMessage;
use tracing::debug;

#[derive(Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        self.drain_lines(false)
    }

    pub fn finish(&mut self) -> Vec<String> {
        self.drain_lines(true)
    }

    fn drain_lines(&mut self, flush: bool) -> Vec<String> {
        let mut lines = Vec::new();
        let mut search_index = 0;

        while let Some(relative_pos) = memchr(b'\n', &self.buffer[search_index..]) {
            let newline_index = search_index + relative_pos;
            let mut line_end = newline_index;
            if line_end > search_index && self.buffer[line_end - 1] == b'\r' {
                line_end -= 1;
            }

            if let Ok(text) = std::str::from_utf8(&self.buffer[search_index..line_end]) {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    lines.push(trimmed.to_string());
                }
            }

            search_index = newline_index + 1;
        }

        if flush {
            if let Ok(text) = std::str::from_utf8(&self.buffer[search_index..]) {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    lines.push(trimmed.to_string());
                }
            }
            self.buffer.clear();
        } else if search_index > 0 {
            self.buffer.drain(..search_index);
        }

        lines
    }
}

pub fn is_event_stream_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|value| value.eq_ignore_ascii_case("text/event-stream"))
}

pub fn sse_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}

/// Reads an event-stream response until the first JSON-RPC response or error.
///
/// Server-initiated requests and notifications that arrive first are skipped;
/// this client advertises no capabilities that would require answering them.
pub async fn next_sse_server_message(response: reqwest::Response) -> Result<ServerMessage, String> {
    let mut stream = response.bytes_stream();
    let mut buffer = SseLineBuffer::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| err.to_string())?;
        for line in buffer.push(&chunk) {
            if let Some(message) = take_terminal_message(&line)? {
                return Ok(message);
            }
        }
    }

    for line in buffer.finish() {
        if let Some(message) = take_terminal_message(&line)? {
            return Ok(message);
        }
    }

    Err("Empty event-stream response.".to_string())
}

fn take_terminal_message(line: &str) -> Result<Option<ServerMessage>, String> {
    let Some(message) = decode_sse_line(line)? else {
        return Ok(None);
    };
    if matches!(
        message,
        ServerMessage::Response(_) | ServerMessage::Error(_)
    ) {
        Ok(Some(message))
    } else {
        debug!("Skipping non-terminal MCP server message on event stream");
        Ok(None)
    }
}

fn decode_sse_line(line: &str) -> Result<Option<ServerMessage>, String> {
    let Some(payload) = sse_data_payload(line) else {
        return Ok(None);
    };

    if payload.is_empty() {
        return Ok(None);
    }

    serde_json::from_str::<ServerMessage>(payload)
        .map(Some)
        .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_buffer_handles_partial_lines() {
        let mut buffer = SseLineBuffer::default();
        assert!(buffer.push(b"data: one").is_empty());
        assert_eq!(buffer.push(b"\n\n"), vec!["data: one"]);
        assert!(buffer.finish().is_empty());
    }

    #[test]
    fn sse_line_buffer_handles_chunk_boundaries_and_crlf() {
        let mut buffer = SseLineBuffer::default();
        assert_eq!(buffer.push(b"event: message\r\ndata: t"), vec!["event: message"]);
        assert_eq!(buffer.push(b"wo\r\n"), vec!["data: two"]);
        assert_eq!(buffer.push(b"data: tail"), Vec::<String>::new());
        assert_eq!(buffer.finish(), vec!["data: tail"]);
    }

    #[test]
    fn detects_event_stream_content_type() {
        assert!(is_event_stream_content_type("text/event-stream"));
        assert!(is_event_stream_content_type(
            "Text/Event-Stream; charset=UTF-8"
        ));
        assert!(!is_event_stream_content_type("application/json"));
    }

    #[test]
    fn extracts_sse_payload() {
        assert_eq!(sse_data_payload("data: {\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(sse_data_payload("data:"), Some(""));
        assert_eq!(sse_data_payload("event: message"), None);
    }

    #[test]
    fn terminal_message_skips_comments_and_accepts_responses() {
        assert!(take_terminal_message(": keep-alive")
            .expect("comment lines are ignored")
            .is_none());
        let message = take_terminal_message(
            "data: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"content\":[]}}",
        )
        .expect("response should decode");
        assert!(matches!(message, Some(ServerMessage::Response(_))));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(take_terminal_message("data: {not json").is_err());
    }
}
