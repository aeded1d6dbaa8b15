mod agent;
mod config;
mod context;
mod conversation;
mod gateway;
mod llm_client;
mod router;

use std::time::Duration;

use anyhow::Result;
use flume::unbounded;
use tracing_subscriber::EnvFilter;

use agent::Agent;
use config::BotConfig;
use gateway::Gateway;
use llm_client::LlmClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,faby=debug")),
        )
        .init();

    let config = BotConfig::load();

    tracing::info!(
        "Faby starting (model: {}, bridge: {})",
        config.llm_model,
        config.bridge_url
    );
    if config.llm_api_key.as_deref().unwrap_or("").trim().is_empty() {
        tracing::warn!("OPENAI_API_KEY/LLM_API_KEY is unset; completion requests will fail");
    }

    let llm = LlmClient::new(
        config.llm_api_url.clone(),
        config.llm_api_key.clone().unwrap_or_default(),
        config.llm_model.clone(),
        Duration::from_secs(config.request_timeout_secs),
    );
    let gateway = Gateway::new(config.bridge_url.clone(), config.poll_timeout_secs);
    let mut agent = Agent::new(config, llm);

    let (tx, rx) = unbounded();
    gateway.spawn_poller(tx);

    // One message at a time, each handled to completion before the next.
    while let Ok(msg) = rx.recv_async().await {
        if let Some(reply) = agent.handle_message(&msg).await {
            gateway.send_message(&msg.chat_id, &reply).await;
        }
    }

    tracing::info!("Bridge poller stopped; shutting down");
    Ok(())
}
