//! Transport-bridge binding.
//!
//! The bridge sidecar owns the actual chat protocol: connection lifecycle,
//! credential storage, encryption, read receipts and typing indicators. The
//! bot only long-polls it for inbound messages and posts plain-text replies
//! back, so none of that protocol state leaks in here.

use serde::Deserialize;

use crate::router::InboundMessage;

#[derive(Deserialize)]
struct BridgeResponse<T> {
    ok: bool,
    result: Option<T>,
}

#[derive(Clone)]
pub struct Gateway {
    client: reqwest::Client,
    base_url: String,
    poll_timeout_secs: u64,
}

impl Gateway {
    pub fn new(base_url: String, poll_timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_timeout_secs,
        }
    }

    /// Spawn the long-poll task, feeding inbound messages into `tx` in
    /// arrival order.
    pub fn spawn_poller(&self, tx: flume::Sender<InboundMessage>) {
        let gateway = self.clone();
        tokio::spawn(async move {
            tracing::info!("Polling transport bridge at {}", gateway.base_url);
            loop {
                let messages = match gateway.poll_messages().await {
                    Some(m) => m,
                    None => continue,
                };

                for msg in messages {
                    if tx.send_async(msg).await.is_err() {
                        tracing::info!("Message channel closed; stopping bridge poller");
                        return;
                    }
                }
            }
        });
    }

    async fn poll_messages(&self) -> Option<Vec<InboundMessage>> {
        let url = format!("{}/messages", self.base_url);
        let params = serde_json::json!({ "timeout": self.poll_timeout_secs });

        let resp = match self.client.post(&url).json(&params).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Bridge poll error: {}", e);
                tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                return None;
            }
        };

        let body: BridgeResponse<Vec<InboundMessage>> = match resp.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("Bridge poll parse error: {}", e);
                tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                return None;
            }
        };

        if !body.ok {
            tracing::warn!("Bridge returned ok=false");
            tokio::time::sleep(tokio::time::Duration::from_secs(10)).await;
            return None;
        }

        Some(body.result.unwrap_or_default())
    }

    /// Send a plain-text reply to a chat. Delivery choreography (presence,
    /// typing indicator) is the bridge's business.
    pub async fn send_message(&self, chat_id: &str, text: &str) {
        let url = format!("{}/send", self.base_url);
        let payload = serde_json::json!({ "chat_id": chat_id, "text": text });

        match self.client.post(&url).json(&payload).send().await {
            Ok(r) if r.status().is_success() => {
                tracing::debug!("Sent reply to chat {}", chat_id);
            }
            Ok(r) => {
                tracing::warn!("Bridge send failed: HTTP {}", r.status());
            }
            Err(e) => {
                tracing::error!("Bridge send error: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_envelope_parses_messages() {
        let body = r#"{
            "ok": true,
            "result": [
                {
                    "chat_id": "12036304@g.us",
                    "sender": "5492611234567@s.whatsapp.net",
                    "body": "hola @Faby",
                    "from_me": false,
                    "is_group": true,
                    "mentions": ["5492610000000@s.whatsapp.net"]
                }
            ]
        }"#;

        let parsed: BridgeResponse<Vec<InboundMessage>> = serde_json::from_str(body).unwrap();
        assert!(parsed.ok);
        let messages = parsed.result.unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_group);
        assert_eq!(messages[0].mentions.len(), 1);
    }

    #[test]
    fn bridge_envelope_defaults_optional_message_fields() {
        let body = r#"{"ok": true, "result": [{"chat_id": "x@s.whatsapp.net"}]}"#;

        let parsed: BridgeResponse<Vec<InboundMessage>> = serde_json::from_str(body).unwrap();
        let messages = parsed.result.unwrap();
        assert!(!messages[0].from_me);
        assert!(messages[0].body.is_empty());
        assert!(messages[0].mentions.is_empty());
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let gateway = Gateway::new("http://localhost:3001/".to_string(), 30);
        assert_eq!(gateway.base_url, "http://localhost:3001");
    }
}
