use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Seam between the agent and the completion service, so the agent can be
/// exercised against a mock backend.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn generate(&self, messages: Vec<Message>) -> Result<String>;
}

#[derive(Clone)]
pub struct LlmClient {
    api_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl LlmClient {
    pub fn new(api_url: String, api_key: String, model: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_url,
            api_key,
            model,
            client,
        }
    }
}

#[async_trait]
impl Completion for LlmClient {
    /// Generate a completion using the OpenAI API format
    async fn generate(&self, messages: Vec<Message>) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_url.trim_end_matches('/'));

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
        };

        let mut req = self.client.post(&url).json(&request);

        // Add API key header if provided (not needed for local models)
        if !self.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = req.send().await.context("Failed to send LLM request")?;

        // Check for HTTP errors and include response body for debugging
        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            anyhow::bail!("LLM API returned error {}: {}", status, body);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse LLM response")?;

        // Some upstream failures come back as 200 with an error payload.
        if let Some(error) = completion.error {
            anyhow::bail!("LLM API returned error: {}", error.message);
        }

        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("No response from LLM"))?;

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_first_choice_content() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "che, ¿todo bien?"}},
                {"message": {"role": "assistant", "content": "segunda opción"}}
            ]
        }"#;

        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.error.is_none());
        assert_eq!(parsed.choices[0].message.content, "che, ¿todo bien?");
    }

    #[test]
    fn parses_an_error_payload() {
        let body = r#"{"error": {"message": "rate limited", "type": "rate_limit_error"}}"#;

        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.choices.is_empty());
        assert_eq!(parsed.error.unwrap().message, "rate limited");
    }

    #[test]
    fn request_serializes_roles_in_order() {
        let request = ChatCompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: "persona".to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: "hola".to_string(),
                },
            ],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hola");
    }
}
