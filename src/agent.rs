//! The bot core: classifies each inbound message and produces the outbound
//! reply text, if any.
//!
//! Messages are handled strictly one at a time by the caller's loop, each to
//! completion (including the completion-service call) before the next, so
//! the store and context need no locking.

use anyhow::Result;

use crate::config::BotConfig;
use crate::context::StaticContext;
use crate::conversation::{ConversationStore, Role};
use crate::llm_client::{Completion, Message};
use crate::router::{InboundMessage, Router, RoutingDecision};

pub struct Agent<C: Completion> {
    config: BotConfig,
    router: Router,
    store: ConversationStore,
    context: StaticContext,
    completion: C,
}

impl<C: Completion> Agent<C> {
    pub fn new(config: BotConfig, completion: C) -> Self {
        let router = Router::new(
            config.self_id.clone(),
            config.handle.clone(),
            config.reload_command.clone(),
        );
        let store = ConversationStore::new(config.max_turns);
        let context = StaticContext::load(&config.context_files);

        Self {
            config,
            router,
            store,
            context,
            completion,
        }
    }

    /// Handle one inbound message. Returns the reply to send back to the
    /// originating chat, or `None` when the message is not for the bot.
    pub async fn handle_message(&mut self, msg: &InboundMessage) -> Option<String> {
        match self.router.classify(msg) {
            RoutingDecision::Ignored => {
                tracing::debug!(
                    "Ignoring message in {} (not a mention, not a direct chat)",
                    msg.chat_id
                );
                None
            }
            RoutingDecision::ReloadContext => {
                tracing::info!("Reload command from {} in {}", msg.sender, msg.chat_id);
                self.context.reload();
                Some(self.config.reload_confirmation.clone())
            }
            RoutingDecision::Answer(prompt) => {
                tracing::info!("Prompt from {} in {}: {:?}", msg.sender, msg.chat_id, prompt);
                Some(self.respond(&msg.chat_id, &prompt).await)
            }
        }
    }

    /// Run one completion round for a conversation.
    ///
    /// The user turn is appended before the request is issued and stays in
    /// the transcript even when the request fails, so the prompt is still
    /// part of the history on the next attempt. Any upstream failure is
    /// logged and replaced by the fixed fallback reply.
    pub async fn respond(&mut self, chat_id: &str, prompt: &str) -> String {
        self.store.append(chat_id, Role::User, prompt);

        match self.request_completion(chat_id).await {
            Ok(reply) => {
                self.store.append(chat_id, Role::Assistant, reply.clone());
                tracing::info!("Reply for {}: {:?}", chat_id, reply);
                reply
            }
            Err(e) => {
                tracing::error!("Completion failed for {}: {:#}", chat_id, e);
                self.config.fallback_reply.clone()
            }
        }
    }

    async fn request_completion(&self, chat_id: &str) -> Result<String> {
        let system = self
            .config
            .persona_instructions
            .replace("{context}", self.context.current());

        let mut messages = Vec::with_capacity(self.store.transcript(chat_id).len() + 1);
        messages.push(Message {
            role: "system".to_string(),
            content: system,
        });
        for turn in self.store.transcript(chat_id) {
            messages.push(Message {
                role: turn.role.as_str().to_string(),
                content: turn.content.clone(),
            });
        }

        self.completion.generate(messages).await
    }

    #[cfg(test)]
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }
}
