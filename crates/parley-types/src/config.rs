//! Global configuration types for Parley.
//!
//! `ParleyConfig` represents the `config.toml` in the data directory that
//! controls the model backend, the assistant persona, storage, and the
//! HTTP listener.

use serde::{Deserialize, Serialize};

use crate::session::DEFAULT_SYSTEM_PROMPT;

/// Top-level configuration.
///
/// Loaded from `~/.parley/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParleyConfig {
    /// Model identifier sent to the backend.
    #[serde(default = "default_model")]
    pub model: String,

    /// Persona seeded as the system turn of every new session.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum completion tokens per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature; backend default when unset.
    #[serde(default)]
    pub temperature: Option<f64>,

    /// SQLite URL for the session store. Defaults to `{data_dir}/parley.db`.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Maximum entries in the sidebar's recent list.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    /// HTTP listener host.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP listener port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of a built front-end to serve at `/`.
    #[serde(default)]
    pub web_dir: Option<String>,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_recent_limit() -> usize {
    15
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            system_prompt: default_system_prompt(),
            base_url: default_base_url(),
            max_tokens: default_max_tokens(),
            temperature: None,
            database_url: None,
            recent_limit: default_recent_limit(),
            host: default_host(),
            port: default_port(),
            web_dir: None,
        }
    }
}

impl ParleyConfig {
    /// The subset of settings the chat service needs.
    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            model: self.model.clone(),
            system_prompt: self.system_prompt.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            recent_limit: self.recent_limit,
        }
    }
}

/// Settings consumed by the session service.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    pub model: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub recent_limit: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        ParleyConfig::default().chat_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = ParleyConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.system_prompt, "You are a helpful chatbot.");
        assert_eq!(config.recent_limit, 15);
        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_config_partial_toml_fills_defaults() {
        let config: ParleyConfig = toml::from_str(
            r#"
model = "gpt-4o"
port = 8080
"#,
        )
        .unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_chat_settings_mirror_config() {
        let config = ParleyConfig {
            recent_limit: 5,
            temperature: Some(0.2),
            ..ParleyConfig::default()
        };
        let settings = config.chat_settings();
        assert_eq!(settings.recent_limit, 5);
        assert_eq!(settings.temperature, Some(0.2));
        assert_eq!(settings.model, config.model);
    }
}
