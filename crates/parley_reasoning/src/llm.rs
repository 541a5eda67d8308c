use async_trait::async_trait;
use parley_core::error::GenerationError;

use crate::api_types::ChatMessage;

/// Parameters for one completion request.
#[derive(Debug, Clone)]
pub struct CompletionParams {
    /// Maximum tokens to generate (will be clamped to provider limits)
    pub max_tokens: u32,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
    /// Name of the structured shape requested, `None` for free text.
    pub response_shape: Option<String>,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            max_tokens: 3000,
            temperature: 0.7,
            response_shape: None,
        }
    }
}

impl CompletionParams {
    pub fn structured(shape: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
            response_shape: Some(shape.into()),
        }
    }
}

/// The external text/decision collaborator.
///
/// Implementations report failures as [`GenerationError`] so callers can tell
/// transport trouble from a refused request.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<String, GenerationError>;
}
