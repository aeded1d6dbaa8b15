//! In-memory conversation transcripts, one per chat.
//!
//! Conversations are created lazily on first append and live for the
//! process lifetime. Turns are append-only; the only removals are an
//! explicit `reset` and the retention cap, which drops the oldest turns
//! once a conversation exceeds `max_turns`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ConversationStore {
    conversations: HashMap<String, Vec<Turn>>,
    max_turns: usize,
}

impl ConversationStore {
    pub fn new(max_turns: usize) -> Self {
        Self {
            conversations: HashMap::new(),
            max_turns,
        }
    }

    /// Append a turn to a conversation, creating it if absent.
    pub fn append(&mut self, chat_id: &str, role: Role, content: impl Into<String>) {
        let turns = self.conversations.entry(chat_id.to_string()).or_default();
        turns.push(Turn {
            role,
            content: content.into(),
            at: Utc::now(),
        });

        if self.max_turns > 0 && turns.len() > self.max_turns {
            let excess = turns.len() - self.max_turns;
            turns.drain(..excess);
            tracing::debug!(
                "Trimmed {} old turn(s) from conversation {} (cap: {})",
                excess,
                chat_id,
                self.max_turns
            );
        }
    }

    /// The stored transcript in append order; empty for unknown chats.
    pub fn transcript(&self, chat_id: &str) -> &[Turn] {
        self.conversations
            .get(chat_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drop all turns for a conversation.
    pub fn reset(&mut self, chat_id: &str) {
        if let Some(turns) = self.conversations.get_mut(chat_id) {
            turns.clear();
        }
    }
}
