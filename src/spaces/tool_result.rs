//! Decoding of `tools/call` results returned by the Copilot Spaces server.
//!
//! GitHub's server answers with embedded `resource` items whose `text` holds a
//! JSON document; other servers answer with plain `text` items. Both shapes are
//! accepted and only the first item of a result is considered.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourcePayload {
    #[serde(default)]
    pub uri: String,
    #[serde(rename = "mimeType", default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// One entry of a tool result's `content` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ToolContentItem {
    Resource { resource: ResourcePayload },
    Text {
        #[serde(default)]
        text: Option<String>,
    },
}

impl ToolContentItem {
    /// Items that match neither shape (images, blobs without text, stray
    /// non-string fields) decode as a text item without text.
    fn from_value(value: &Value) -> Self {
        ToolContentItem::deserialize(value).unwrap_or(ToolContentItem::Text { text: None })
    }

    pub fn resource(&self) -> Option<&ResourcePayload> {
        match self {
            ToolContentItem::Resource { resource } => Some(resource),
            ToolContentItem::Text { .. } => None,
        }
    }

    fn payload_text(&self) -> Option<&str> {
        match self {
            ToolContentItem::Resource { resource } => resource.text.as_deref(),
            ToolContentItem::Text { text } => text.as_deref(),
        }
    }
}

/// The `content` sequence and `isError` flag of a tool result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallOutput {
    pub content: Vec<ToolContentItem>,
    pub is_error: bool,
}

impl ToolCallOutput {
    pub fn from_result(result: &Value) -> Self {
        let content = result
            .get("content")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(ToolContentItem::from_value).collect())
            .unwrap_or_default();
        let is_error = result
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Self { content, is_error }
    }
}

/// A tool payload: parsed JSON when the text is valid JSON, the raw text
/// otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Json(Value),
    Raw(String),
}

impl Decoded {
    fn from_text(text: &str) -> Self {
        serde_json::from_str(text)
            .map(Decoded::Json)
            .unwrap_or_else(|_| Decoded::Raw(text.to_string()))
    }
}

/// Decodes the first content item of `output`; `None` when there is nothing
/// to decode.
pub fn decode_first_item(output: &ToolCallOutput) -> Option<Decoded> {
    let Some(item) = output.content.first() else {
        warn!("MCP tool result has no content");
        return None;
    };

    let Some(text) = item.payload_text() else {
        warn!(item = ?item, "MCP tool result item has no text");
        return None;
    };

    debug!(preview = %preview(text), "MCP tool result text");
    Some(Decoded::from_text(text))
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
