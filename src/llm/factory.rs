//! Model client factory.
//!
//! Centralizes provider-specific logic for creating model clients.

use crate::config::LlmConfig;
use crate::error::Result;
use crate::llm::{LlmClient, LlmProvider, MockLlmClient, OllamaClient, OllamaConfig};

/// Creates a model client for the configured provider.
pub fn create_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    match config.provider()? {
        LlmProvider::Ollama => Ok(Box::new(OllamaClient::new(ollama_config(config))?)),
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}

/// Builds the Ollama client configuration from the model section.
pub fn ollama_config(config: &LlmConfig) -> OllamaConfig {
    OllamaConfig::new(config.model.clone())
        .with_url(config.base_url.clone())
        .with_timeout(config.timeout())
        .with_temperature(config.temperature)
}
