//! Structured and free-text generation on top of [`LlmClient`].
//!
//! Structured calls append the target JSON schema to the conversation and parse
//! the reply leniently (bare JSON, fenced code block, or the outermost object
//! embedded in prose). A reply that still does not fit is a retryable
//! [`GenerationError::Parse`].

use parley_core::config::RetryConfig;
use parley_core::error::GenerationError;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::api_types::ChatMessage;
use crate::llm::{CompletionParams, LlmClient};
use crate::retry::with_retry;

/// Shared knobs for one generation call.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    pub retry: RetryConfig,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_tokens: 3000,
            temperature: 0.3,
            retry: RetryConfig::default(),
        }
    }
}

/// Free-form completion with retry. Empty replies count as parse failures.
pub async fn generate_text(
    client: &dyn LlmClient,
    messages: &[ChatMessage],
    settings: &GenerationSettings,
) -> Result<String, GenerationError> {
    with_retry(&settings.retry, "generate_text", settings.temperature, |t| {
        let params = CompletionParams {
            max_tokens: settings.max_tokens,
            temperature: t,
            response_shape: None,
        };
        async move {
            let text = client.complete(messages, params).await?;
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(GenerationError::parse("text", "empty completion"));
            }
            Ok(trimmed.to_string())
        }
    })
    .await
}

/// Requests a value of shape `T`, validated against its schema on the way back.
pub async fn generate_structured<T>(
    client: &dyn LlmClient,
    messages: &[ChatMessage],
    shape: &str,
    settings: &GenerationSettings,
) -> Result<T, GenerationError>
where
    T: DeserializeOwned + JsonSchema,
{
    let mut request = messages.to_vec();
    request.push(ChatMessage::system(schema_instruction::<T>()?));
    let request = request.as_slice();

    with_retry(&settings.retry, shape, settings.temperature, |t| {
        let params = CompletionParams::structured(shape, settings.max_tokens, t);
        async move {
            let text = client.complete(request, params).await?;
            parse_lenient::<T>(&text, shape)
        }
    })
    .await
}

fn schema_instruction<T: JsonSchema>() -> Result<String, GenerationError> {
    let schema = schemars::schema_for!(T);
    let schema = serde_json::to_string(&schema)
        .map_err(|e| GenerationError::Rejected(format!("unserializable schema: {}", e)))?;
    Ok(format!(
        "応答は次のJSONスキーマに準拠したJSONオブジェクトのみを返してください。余分なテキストや説明は含めないでください。\n{}",
        schema
    ))
}

/// Parse the LLM's response, handling common formatting quirks.
pub fn parse_lenient<T: DeserializeOwned>(text: &str, shape: &str) -> Result<T, GenerationError> {
    let trimmed = text.trim();

    // Try direct parse first
    let direct_err = match serde_json::from_str::<T>(trimmed) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };

    // Try extracting JSON from markdown code block or surrounding prose
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(v) = serde_json::from_str::<T>(&trimmed[start..=end]) {
                return Ok(v);
            }
        }
    }

    tracing::debug!("Could not parse {} response: {}", shape, trimmed);
    Err(GenerationError::parse(shape, direct_err.to_string()))
}
