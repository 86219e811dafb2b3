//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, LLMError, Result};
use async_trait::async_trait;

/// Trait for LLM providers
///
/// Implementations of this trait provide access to different LLM services
/// (e.g., OpenAI or any OpenAI-compatible endpoint).
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    ///
    /// # Arguments
    ///
    /// * `request` - The completion request with messages and parameters
    ///
    /// # Returns
    ///
    /// The completion response with the assistant's message and metadata
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "openai")
    fn name(&self) -> &str;

    /// Complete a request and return only the generated text
    ///
    /// A response without any text is reported as [`LLMError::EmptyCompletion`].
    async fn complete_text(&self, request: CompletionRequest) -> Result<String> {
        let response = self.complete(request).await?;
        response
            .message
            .text()
            .map(str::to_string)
            .ok_or(LLMError::EmptyCompletion)
    }
}
