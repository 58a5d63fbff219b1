use crate::llm_provider::*;
use crate::openai_compatible_provider::{OpenAICompatibleConfig, OpenAICompatibleProvider};
use crate::retry::BackoffPolicy;
use skychart_core::config_manager::LLMConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Factory for creating LLM providers based on configuration
pub struct LLMProviderFactory;

impl LLMProviderFactory {
    /// Create the chat completions provider described by `config`.
    ///
    /// A missing credential is not rejected here; every call made through the
    /// provider fails fast instead.
    pub fn create_from_config(config: &LLMConfig) -> LLMResult<Arc<dyn LLMProvider>> {
        if config.api_key.is_none() {
            warn!("No API key configured; completion calls will fail until one is provided");
        }

        let provider_config = Self::provider_config(config);
        let policy = BackoffPolicy::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
        );

        let provider = OpenAICompatibleProvider::new(provider_config)?
            .with_retry_policy(Arc::new(policy));
        Ok(Arc::new(provider))
    }

    fn provider_config(config: &LLMConfig) -> OpenAICompatibleConfig {
        OpenAICompatibleConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            provider_name: "openai-compatible".to_string(),
        }
    }
}
