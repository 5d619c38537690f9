//! # AI Provider Factory
//!
//! Builds provider instances from their configuration entries, so that the
//! server and tests share one mapping from provider kind to implementation.

use crate::{
    errors::SpotError,
    providers::ai::{anthropic::AnthropicProvider, local::LocalAiProvider, AiProvider},
};
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

/// A reusable configuration for a specific AI provider instance.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// The type of provider ("anthropic" or "local").
    pub provider: String,
    /// The chat endpoint to call.
    pub api_url: String,
    /// The API key, which can be null for gateways and local providers.
    #[serde(default)]
    pub api_key: Option<String>,
    pub model_name: String,
    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Instantiates the provider described by `config`.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Box<dyn AiProvider>, SpotError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    // An empty key from an unset `${VAR}` substitution means "no key".
    let api_key = config.api_key.clone().filter(|key| !key.is_empty());

    let provider: Box<dyn AiProvider> = match config.provider.as_str() {
        "anthropic" => Box::new(AnthropicProvider::new(
            config.api_url.clone(),
            api_key,
            config.model_name.clone(),
            timeout,
        )?),
        "local" => Box::new(LocalAiProvider::new(
            config.api_url.clone(),
            api_key,
            Some(config.model_name.clone()),
            timeout,
        )?),
        other => {
            return Err(SpotError::UnsupportedAiProvider(format!(
                "'{other}' for provider '{name}'"
            )))
        }
    };

    info!(provider = %name, kind = %config.provider, model = %config.model_name, "Configured AI provider.");
    Ok(provider)
}
