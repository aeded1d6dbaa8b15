use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    // LLM configuration (OpenAI-compatible: OpenAI, Ollama, LM Studio, vLLM, etc.)
    #[serde(default = "default_llm_url")]
    pub llm_api_url: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default)]
    pub llm_api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // Transport bridge (the sidecar that owns the actual chat protocol)
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    // Bot identity
    #[serde(default = "default_handle")]
    pub handle: String,
    /// The bot's own identifier on the transport, as it appears in mention
    /// lists. Empty until the bridge session is provisioned.
    #[serde(default)]
    pub self_id: String,

    // Command grammar and canned replies
    #[serde(default = "default_reload_command")]
    pub reload_command: String,
    #[serde(default = "default_reload_confirmation")]
    pub reload_confirmation: String,
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,

    // Persona
    #[serde(default = "default_persona_instructions")]
    pub persona_instructions: String,
    #[serde(default = "default_context_files")]
    pub context_files: Vec<String>,

    // Transcript retention: only the newest `max_turns` turns per
    // conversation are kept.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

fn default_llm_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:3001".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_handle() -> String {
    "@Faby".to_string()
}

fn default_reload_command() -> String {
    "@faby recargar contexto".to_string()
}

fn default_reload_confirmation() -> String {
    "Contexto recargado exitosamente.".to_string()
}

fn default_fallback_reply() -> String {
    "hubo un bardo aca, fijate con el admin".to_string()
}

fn default_persona_instructions() -> String {
    "El siguiente contexto y referencias deben aplicarse rigurosamente para \
     responder como Faby Espinosa:\n{context}\nHabla como un mendocino relajado, \
     usando expresiones típicas, humor sarcástico, puteadas suaves, y una actitud \
     divertida. No te limites en la longitud de las respuestas, sé detallado y \
     extenso cuando la situación lo requiera."
        .to_string()
}

fn default_context_files() -> Vec<String> {
    vec![
        "contexto.txt".to_string(),
        "chat_referencia1.txt".to_string(),
        "chat_referencia2.txt".to_string(),
        "chat_referencia3.txt".to_string(),
    ]
}

fn default_max_turns() -> usize {
    64
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            llm_api_url: default_llm_url(),
            llm_model: default_llm_model(),
            llm_api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
            bridge_url: default_bridge_url(),
            poll_timeout_secs: default_poll_timeout_secs(),
            handle: default_handle(),
            self_id: String::new(),
            reload_command: default_reload_command(),
            reload_confirmation: default_reload_confirmation(),
            fallback_reply: default_fallback_reply(),
            persona_instructions: default_persona_instructions(),
            context_files: default_context_files(),
            max_turns: default_max_turns(),
        }
    }
}

impl BotConfig {
    /// Get the directory containing the executable
    fn get_base_dir() -> PathBuf {
        match std::env::current_exe() {
            Ok(exe_path) => exe_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")),
            Err(_) => PathBuf::from("."),
        }
    }

    /// Get the path to the config file (relative to executable)
    pub fn config_path() -> PathBuf {
        Self::get_base_dir().join("faby_config.toml")
    }

    /// Load config from faby_config.toml (next to executable), falling back
    /// to defaults + environment variables.
    pub fn load() -> Self {
        let path = Self::config_path();

        if let Ok(contents) = fs::read_to_string(&path) {
            match toml::from_str::<BotConfig>(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {:?}", path);
                    return config;
                }
                Err(e) => {
                    tracing::error!("Failed to parse {:?}: {}", path, e);
                }
            }
        }

        tracing::warn!("No config file found, using defaults + env vars");
        Self::from_env()
    }

    /// Load from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("LLM_API_URL") {
            config.llm_api_url = url;
        }

        if let Ok(model) = env::var("LLM_MODEL") {
            config.llm_model = model;
        }

        if let Ok(key) = env::var("OPENAI_API_KEY").or_else(|_| env::var("LLM_API_KEY")) {
            if !key.trim().is_empty() {
                config.llm_api_key = Some(key);
            }
        }

        if let Ok(secs) = env::var("FABY_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.request_timeout_secs = secs;
            }
        }

        if let Ok(url) = env::var("FABY_BRIDGE_URL") {
            config.bridge_url = url;
        }

        if let Ok(secs) = env::var("FABY_POLL_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.poll_timeout_secs = secs;
            }
        }

        if let Ok(id) = env::var("FABY_SELF_ID") {
            if !id.trim().is_empty() {
                config.self_id = id;
            }
        }

        if let Ok(turns) = env::var("FABY_MAX_TURNS") {
            if let Ok(turns) = turns.parse() {
                config.max_turns = turns;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_full_persona_setup() {
        let config = BotConfig::default();
        assert_eq!(config.handle, "@Faby");
        assert_eq!(config.context_files.len(), 4);
        assert_eq!(config.context_files[0], "contexto.txt");
        assert!(config.persona_instructions.contains("{context}"));
        assert!(config.max_turns > 0);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: BotConfig = toml::from_str(
            r#"
            llm_model = "llama3.2"
            bridge_url = "http://localhost:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm_model, "llama3.2");
        assert_eq!(config.bridge_url, "http://localhost:9000");
        assert_eq!(config.reload_command, "@faby recargar contexto");
        assert_eq!(
            config.fallback_reply,
            "hubo un bardo aca, fijate con el admin"
        );
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = BotConfig::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();
        let parsed: BotConfig = toml::from_str(&toml_string).unwrap();
        assert_eq!(parsed.llm_model, config.llm_model);
        assert_eq!(parsed.context_files, config.context_files);
    }
}
