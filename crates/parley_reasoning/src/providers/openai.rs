use anyhow::{Context, Result};
use parley_core::config::LlmConfig;
use parley_core::error::GenerationError;
use reqwest::{Client, StatusCode};
use std::env;
use std::time::Duration;

use crate::api_types::{ChatMessage, ChatRequest, ChatResponse};
use crate::llm::{CompletionParams, LlmClient};

/// OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
        let base_url = config
            .base_url
            .clone()
            .or_else(|| env::var("OPENAI_BASE_URL").ok())
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(120)).build()?,
            api_key,
            base_url,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

/// Determine if a status code is worth another attempt.
fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn classify_status(status: StatusCode, body: &str) -> GenerationError {
    let detail = format!(
        "OpenAI API error ({}): {}",
        status,
        body.chars().take(200).collect::<String>()
    );
    if is_retryable_status(status) {
        GenerationError::Transport(detail)
    } else {
        GenerationError::Rejected(detail)
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<String, GenerationError> {
        let payload = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: params.max_tokens.min(self.max_tokens),
            temperature: params.temperature,
            response_format: params
                .response_shape
                .as_ref()
                .map(|_| serde_json::json!({"type": "json_object"})),
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Transport(format!("OpenAI response unreadable: {}", e)))?;
        if let Some(reason) = parsed.choices.first().and_then(|c| c.finish_reason.as_deref()) {
            if reason == "length" {
                tracing::warn!("OpenAI completion truncated at max_tokens");
            }
        }
        parsed
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| GenerationError::parse("chat completion", "no message content"))
    }
}
