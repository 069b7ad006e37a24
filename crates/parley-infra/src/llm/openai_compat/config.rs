//! Configuration for the OpenAI-compatible provider.

use parley_types::config::ParleyConfig;
use secrecy::SecretString;

/// Configuration for an OpenAI-compatible LLM provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`]. Does not derive
/// Debug so the API key never reaches a log line.
pub struct OpenAiCompatConfig {
    /// Human-readable provider name for logs and spans.
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
    /// Default model when a request leaves it empty.
    pub model: String,
}

impl OpenAiCompatConfig {
    /// Build from the application config and a resolved API key.
    pub fn from_config(config: &ParleyConfig, api_key: SecretString) -> Self {
        Self {
            provider_name: "openai".into(),
            base_url: config.base_url.clone(),
            api_key,
            model: config.model.clone(),
        }
    }
}
