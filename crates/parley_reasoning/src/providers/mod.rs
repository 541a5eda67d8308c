//! Concrete [`LlmClient`](crate::llm::LlmClient) implementations.

use anyhow::Result;
use parley_core::config::LlmConfig;
use std::sync::Arc;

use crate::llm::LlmClient;

pub mod mock;
pub mod openai;

/// Builds the provider named by `config.provider`.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(openai::OpenAiClient::new(config)?)),
        "mock" => Ok(Arc::new(mock::MockProvider::new(&config.model))),
        other => anyhow::bail!("Unknown LLM provider `{}` (expected `openai` or `mock`)", other),
    }
}
