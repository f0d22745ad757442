use super::{ChatMessage, ChatRequest};
use crate::core::credential::Credential;
use crate::error::BridgeError;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

const CHAT_REQUEST_TIMEOUT_SECONDS: u64 = 60;
const CHAT_ERROR_BODY_LIMIT: usize = 1000;
const CHAT_USER_AGENT: &str = "GitHubCopilotSpacesUI/1.0";

/// Client for an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct CompletionsClient {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl CompletionsClient {
    pub fn new(url: impl Into<String>, model: impl Into<String>) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(CHAT_REQUEST_TIMEOUT_SECONDS))
            .build()?;
        Ok(Self::with_client(client, url, model))
    }

    pub fn with_client(
        client: reqwest::Client,
        url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `messages` verbatim and returns the decoded body unchanged.
    ///
    /// Non-success statuses are logged with a truncated body and always
    /// returned as [`BridgeError::ChatStatus`].
    pub async fn query_chat(
        &self,
        credential: &Credential,
        space_id: &str,
        messages: &[ChatMessage],
    ) -> Result<Value, BridgeError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", credential.bearer_header())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("User-Agent", CHAT_USER_AGENT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            let truncated = truncate_chars(&body, CHAT_ERROR_BODY_LIMIT);
            error!(status = status.as_u16(), body = %truncated, "Chat completions API error");
            return Err(BridgeError::ChatStatus {
                status: status.as_u16(),
                summary: summarize_error_body(&truncated),
            });
        }

        let data: Value = response.json().await?;
        let model = data.get("model").and_then(Value::as_str).unwrap_or("unknown");
        info!(
            space_ref = %space_id,
            model,
            "Chat completions response received"
        );
        Ok(data)
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}

fn extract_error_summary(value: &Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

/// Prefers the provider's own error message when the body is JSON, falling
/// back to the (already truncated) raw text.
fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    serde_json::from_str::<Value>(trimmed)
        .ok()
        .and_then(|value| extract_error_summary(&value))
        .filter(|summary| !summary.is_empty())
        .unwrap_or_else(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn error_summary_prefers_nested_message() {
        let body = json!({"error": {"message": "Bad   credentials\n", "code": "unauthorized"}});
        assert_eq!(summarize_error_body(&body.to_string()), "Bad credentials");
    }

    #[test]
    fn error_summary_accepts_string_error_and_top_level_message() {
        assert_eq!(summarize_error_body(r#"{"error":"rate limited"}"#), "rate limited");
        assert_eq!(summarize_error_body(r#"{"message":"Not Found"}"#), "Not Found");
    }

    #[test]
    fn error_summary_falls_back_to_plain_text() {
        assert_eq!(summarize_error_body("  upstream exploded  "), "upstream exploded");
        assert_eq!(summarize_error_body(""), "<empty>");
    }

    #[tokio::test]
    async fn success_without_model_field_returns_body() {
        let server = crate::test_utils::spawn_mock_server(|_| {
            crate::test_utils::MockResponse::json(
                200,
                json!({"choices": [{"message": {"content": "ok"}}]}),
            )
        })
        .await;
        let client = CompletionsClient::new(server.url.clone(), "gpt-4o").expect("client builds");

        let body = client
            .query_chat(&Credential::new("ghp_test"), "acme/docs", &[ChatMessage::user("hi")])
            .await
            .expect("chat should succeed");
        assert_eq!(body["choices"][0]["message"]["content"], "ok");
    }
}
