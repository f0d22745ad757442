//! Grounded chat against a Space, shared by the REST and MCP front ends.

use crate::api::{extract_reply, ChatMessage};
use crate::core::conversation::{Conversation, ConversationStore};
use crate::error::BridgeError;
use crate::spaces::SpacesUpstream;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryReply {
    pub conversation_id: String,
    pub response: String,
    pub space_id: String,
}

/// Reply to a stateless query whose history is supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReply {
    pub response: String,
    pub space_id: String,
}

pub struct SpaceChat {
    upstream: Arc<dyn SpacesUpstream>,
    conversations: Arc<ConversationStore>,
    history_limit: usize,
}

impl SpaceChat {
    pub fn new(
        upstream: Arc<dyn SpacesUpstream>,
        conversations: Arc<ConversationStore>,
        history_limit: usize,
    ) -> Self {
        Self {
            upstream,
            conversations,
            history_limit,
        }
    }

    pub fn upstream(&self) -> &dyn SpacesUpstream {
        self.upstream.as_ref()
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    /// Continues `conversation_id`, or starts a new grounded conversation
    /// when the id is absent or unknown.
    ///
    /// The user turn is recorded before the chat call, so a failed call
    /// leaves it in the history without an answer.
    pub async fn ask(
        &self,
        owner: &str,
        name: &str,
        prompt: &str,
        conversation_id: Option<&str>,
    ) -> Result<QueryReply, BridgeError> {
        let space_ref = format!("{owner}/{name}");
        let existing = conversation_id
            .and_then(|id| self.conversations.get(id).map(|shared| (id.to_string(), shared)));

        let (conversation_id, shared) = match existing {
            Some(found) => found,
            None => {
                let context = match self.upstream.get_space(&space_ref).await {
                    Ok(space) => space.context,
                    Err(err) => {
                        warn!(space_ref = %space_ref, error = %err, "Could not load space files; starting without them");
                        String::new()
                    }
                };
                let conversation = Conversation::grounded(grounding_prompt(owner, name, &context));
                let (id, shared) = self.conversations.create(conversation);
                debug!(conversation_id = %id, space_ref = %space_ref, "Started conversation");
                (id, shared)
            }
        };

        let mut conversation = shared.lock().await;
        conversation.push_user(prompt);
        let body = self
            .upstream
            .query_chat(&space_ref, conversation.window(self.history_limit))
            .await?;
        let response = extract_reply(&body);
        conversation.push_assistant(response.clone());

        Ok(QueryReply {
            conversation_id,
            response,
            space_id: space_ref,
        })
    }

    /// Sends the last turns of `history_json` plus `prompt`, without touching
    /// the conversation store.
    ///
    /// History that is not a JSON array of `{role, content}` turns is treated
    /// as empty.
    pub async fn ask_with_history(
        &self,
        space_id: &str,
        prompt: &str,
        history_json: &str,
    ) -> Result<HistoryReply, BridgeError> {
        let history = parse_history(history_json);
        let start = history.len().saturating_sub(self.history_limit);
        let mut messages = history[start..].to_vec();
        messages.push(ChatMessage::user(prompt));

        let body = self.upstream.query_chat(space_id, &messages).await?;
        Ok(HistoryReply {
            response: extract_reply(&body),
            space_id: space_id.to_string(),
        })
    }
}

pub fn parse_history(history_json: &str) -> Vec<ChatMessage> {
    serde_json::from_str(history_json).unwrap_or_else(|err| {
        debug!(error = %err, "Ignoring malformed conversation history");
        Vec::new()
    })
}

/// The system turn that opens every REST conversation.
pub fn grounding_prompt(owner: &str, name: &str, context: &str) -> String {
    let mut prompt = format!(
        "You are GitHub Copilot operating in the '{name}' space (owner: {owner}). \
         Answer questions using ONLY the knowledge files below. \
         If the answer is not in the files, say so honestly.\n\n"
    );
    if context.is_empty() {
        prompt.push_str("(No knowledge files are attached to this space yet.)");
    } else {
        prompt.push_str("## Space Knowledge Files\n\n");
        prompt.push_str(context);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChatRole;
    use crate::spaces::{Space, SpaceFile};
    use crate::test_utils::RecordingUpstream;
    use serde_json::{json, Value};

    fn docs_space() -> Space {
        Space {
            name: "docs".to_string(),
            owner: "acme".to_string(),
            space_ref: "acme/docs".to_string(),
            files: vec![SpaceFile {
                path: "a.md".to_string(),
                content: "A".to_string(),
            }],
            context: "### File: a.md\n\nA".to_string(),
        }
    }

    fn chat_with(upstream: Arc<RecordingUpstream>) -> SpaceChat {
        SpaceChat::new(upstream, Arc::new(ConversationStore::new()), 20)
    }

    #[tokio::test]
    async fn two_turn_conversation_keeps_history() {
        let upstream = Arc::new(RecordingUpstream::new(
            Some(docs_space()),
            json!({"choices": [{"message": {"content": "R1"}}]}),
        ));
        let chat = chat_with(Arc::clone(&upstream));

        let first = chat
            .ask("acme", "docs", "hi", None)
            .await
            .expect("first turn");
        assert_eq!(first.conversation_id, "conv-1");
        assert_eq!(first.response, "R1");
        assert_eq!(first.space_id, "acme/docs");

        let second = chat
            .ask("acme", "docs", "more", Some("conv-1"))
            .await
            .expect("second turn");
        assert_eq!(second.conversation_id, "conv-1");

        let calls = upstream.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[0][0].role, ChatRole::System);
        assert!(calls[0][0].content.contains("## Space Knowledge Files\n\n### File: a.md\n\nA"));
        assert_eq!(calls[0][1], ChatMessage::user("hi"));

        assert_eq!(calls[1].len(), 4);
        assert_eq!(calls[1][2], ChatMessage::assistant("R1"));
        assert_eq!(calls[1][3], ChatMessage::user("more"));
        assert_eq!(upstream.fetch_count(), 1);
    }

    #[tokio::test]
    async fn unknown_conversation_id_starts_a_new_one() {
        let upstream = Arc::new(RecordingUpstream::new(Some(docs_space()), json!({"message": {"content": "ok"}})));
        let chat = chat_with(Arc::clone(&upstream));

        let reply = chat
            .ask("acme", "docs", "hi", Some("conv-99"))
            .await
            .expect("reply");
        assert_eq!(reply.conversation_id, "conv-1");
        assert_eq!(reply.response, "ok");
        assert_eq!(chat.conversations().len(), 1);
    }

    #[tokio::test]
    async fn failed_space_fetch_still_grounds_without_files() {
        let upstream = Arc::new(RecordingUpstream::new(None, json!({"choices": []})));
        let chat = chat_with(Arc::clone(&upstream));

        let reply = chat.ask("acme", "docs", "hi", None).await.expect("reply");
        assert_eq!(reply.response, "{\"choices\":[]}");

        let calls = upstream.calls();
        assert!(calls[0][0]
            .content
            .ends_with("(No knowledge files are attached to this space yet.)"));
    }

    #[tokio::test]
    async fn history_queries_take_the_last_twenty_turns() {
        let upstream = Arc::new(RecordingUpstream::new(None, json!({"choices": [{"message": {"content": "R"}}]})));
        let chat = chat_with(Arc::clone(&upstream));
        let history: Vec<Value> = (0..25)
            .map(|index| json!({"role": "user", "content": format!("m{index}")}))
            .collect();

        let reply = chat
            .ask_with_history("acme/docs", "now", &Value::Array(history).to_string())
            .await
            .expect("reply");
        assert_eq!(
            serde_json::to_value(&reply).expect("serialize"),
            json!({"response": "R", "spaceId": "acme/docs"})
        );

        let calls = upstream.calls();
        assert_eq!(calls[0].len(), 21);
        assert_eq!(calls[0][0], ChatMessage::user("m5"));
        assert_eq!(calls[0][20], ChatMessage::user("now"));
        assert!(chat.conversations().is_empty());
    }

    #[tokio::test]
    async fn malformed_history_is_treated_as_empty() {
        let upstream = Arc::new(RecordingUpstream::new(None, json!({"choices": [{"message": {"content": "R"}}]})));
        let chat = chat_with(Arc::clone(&upstream));

        chat.ask_with_history("acme/docs", "now", "not json")
            .await
            .expect("reply");
        assert_eq!(upstream.calls()[0], vec![ChatMessage::user("now")]);
    }

    #[test]
    fn grounding_prompt_mentions_space_and_owner() {
        let prompt = grounding_prompt("acme", "docs", "");
        assert!(prompt.starts_with("You are GitHub Copilot operating in the 'docs' space (owner: acme). "));
        assert!(prompt.contains("say so honestly.\n\n(No knowledge files"));
    }

    #[test]
    fn query_reply_serializes_in_camel_case() {
        let reply = QueryReply {
            conversation_id: "conv-1".to_string(),
            response: "R".to_string(),
            space_id: "acme/docs".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&reply).expect("serialize"),
            json!({"conversationId": "conv-1", "response": "R", "spaceId": "acme/docs"})
        );
    }
}
