//! Decides whether an inbound message should be answered, trigger a context
//! reload, or be dropped.

use serde::Deserialize;

/// An inbound chat message as delivered by the transport bridge.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub chat_id: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub mentions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Not addressed to the bot; drop silently.
    Ignored,
    /// The reload-command literal; re-read the context files.
    ReloadContext,
    /// Forward this prompt to the completion service.
    Answer(String),
}

/// Classification rules, in priority order:
/// 1. own messages and empty bodies are ignored;
/// 2. the reload command (case-insensitive, whole-string match) wins over
///    everything else, so it works in group chats without a mention;
/// 3. direct chats, exact mention-list membership, or the handle token
///    appearing anywhere in the body get an answer;
/// 4. everything else is ignored.
#[derive(Debug, Clone)]
pub struct Router {
    self_id: String,
    handle: String,
    reload_command: String,
}

impl Router {
    pub fn new(
        self_id: impl Into<String>,
        handle: impl Into<String>,
        reload_command: impl Into<String>,
    ) -> Self {
        Self {
            self_id: self_id.into(),
            handle: handle.into(),
            reload_command: reload_command.into(),
        }
    }

    pub fn classify(&self, msg: &InboundMessage) -> RoutingDecision {
        if msg.from_me || msg.body.is_empty() {
            return RoutingDecision::Ignored;
        }

        if msg.body.to_lowercase() == self.reload_command.to_lowercase() {
            return RoutingDecision::ReloadContext;
        }

        let mentioned = (!self.self_id.is_empty()
            && msg.mentions.iter().any(|m| m == &self.self_id))
            || msg.body.contains(&self.handle);

        if !msg.is_group || mentioned {
            return RoutingDecision::Answer(msg.body.clone());
        }

        RoutingDecision::Ignored
    }
}
