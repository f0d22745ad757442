use serde_json::Value;

/// The envelope shapes a completions response can arrive in, checked in this
/// order.
#[derive(Debug, PartialEq)]
pub enum ReplyEnvelope<'a> {
    /// OpenAI style: a non-empty `choices` array; holds the first choice.
    Choices(&'a Value),
    /// A bare top-level `message` object.
    Message(&'a Value),
    /// Anything else.
    Unrecognized,
}

impl<'a> ReplyEnvelope<'a> {
    pub fn classify(response: &'a Value) -> Self {
        if let Some(first) = response
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
        {
            return ReplyEnvelope::Choices(first);
        }
        match response.get("message") {
            Some(message) => ReplyEnvelope::Message(message),
            None => ReplyEnvelope::Unrecognized,
        }
    }
}

/// Normalizes a decoded completions response into the assistant's text.
/// Never fails; unrecognized shapes come back as their JSON text.
pub fn extract_reply(response: &Value) -> String {
    match ReplyEnvelope::classify(response) {
        ReplyEnvelope::Choices(choice) => choice
            .pointer("/message/content")
            .map(content_text)
            .unwrap_or_default(),
        ReplyEnvelope::Message(message) => match message.get("content") {
            Some(content) => content_text(content),
            None => response.to_string(),
        },
        ReplyEnvelope::Unrecognized => response.to_string(),
    }
}

fn content_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
