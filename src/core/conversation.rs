//! In-memory conversation history for the REST front end.

use crate::api::{ChatMessage, ChatRole};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Ordered turns of one conversation. The first turn is always the system
/// grounding turn and is never replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<ChatMessage>,
}

impl Conversation {
    pub fn grounded(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![ChatMessage::system(system_prompt)],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(ChatMessage::assistant(content));
    }

    /// The last `limit` turns. Once the history outgrows the window the system
    /// turn falls out of it like any other turn.
    pub fn window(&self, limit: usize) -> &[ChatMessage] {
        let start = self.turns.len().saturating_sub(limit);
        &self.turns[start..]
    }

    pub fn turns(&self) -> &[ChatMessage] {
        &self.turns
    }

    pub fn system_turns(&self) -> usize {
        self.turns
            .iter()
            .filter(|turn| turn.role == ChatRole::System)
            .count()
    }
}

pub type SharedConversation = Arc<tokio::sync::Mutex<Conversation>>;

/// Process-local store keyed by `conv-<n>` ids.
///
/// Each conversation sits behind its own async mutex so concurrent queries on
/// one id are serialized while different ids proceed independently.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: Mutex<HashMap<String, SharedConversation>>,
    counter: AtomicU64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<SharedConversation> {
        self.conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Stores `conversation` under a freshly assigned id.
    pub fn create(&self, conversation: Conversation) -> (String, SharedConversation) {
        let id = format!("conv-{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1);
        let shared = Arc::new(tokio::sync::Mutex::new(conversation));
        self.conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), Arc::clone(&shared));
        (id, shared)
    }

    pub fn len(&self) -> usize {
        self.conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
