//! LLM provider implementations.
//!
//! Contains the concrete implementations of the [`LlmProvider`] trait defined
//! in `parley-core`: the OpenAI-compatible client and an offline stand-in used
//! when no API key is configured. [`create_provider`] picks one at startup.

pub mod openai_compat;

use secrecy::SecretString;

use parley_core::llm::box_provider::BoxLlmProvider;
use parley_core::llm::provider::LlmProvider;
use parley_types::config::ParleyConfig;
use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use self::openai_compat::config::OpenAiCompatConfig;
use self::openai_compat::OpenAiCompatibleProvider;

/// Environment variable holding the backend API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Provider used when no API key is available. Every call fails with
/// [`LlmError::AuthenticationFailed`], so chat turns get offline replies.
pub struct OfflineProvider;

impl LlmProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Err(LlmError::AuthenticationFailed)
    }
}

/// Read the API key from the environment. Empty values count as unset.
pub fn api_key_from_env() -> Option<SecretString> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
}

/// Create a [`BoxLlmProvider`] from the configuration and an optional key.
pub fn create_provider(config: &ParleyConfig, api_key: Option<SecretString>) -> BoxLlmProvider {
    match api_key {
        Some(key) => {
            tracing::debug!(base_url = %config.base_url, model = %config.model, "Using OpenAI-compatible backend");
            BoxLlmProvider::new(OpenAiCompatibleProvider::new(OpenAiCompatConfig::from_config(
                config, key,
            )))
        }
        None => {
            tracing::warn!("{API_KEY_ENV} is not set, replies will be offline messages");
            BoxLlmProvider::new(OfflineProvider)
        }
    }
}
