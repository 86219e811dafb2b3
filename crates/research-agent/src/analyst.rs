//! Language-model synthesis

use crate::error::Result;
use crate::prompt::with_context;
use research_llm::{CompletionRequest, LLMProvider, Message};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Sends analysis prompts to a language model
#[derive(Clone)]
pub struct Analyst {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
}

impl Analyst {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32) -> Self {
        Self {
            provider,
            temperature,
        }
    }

    /// Ask `model` to answer `prompt`, optionally prefixed by `context`
    ///
    /// The prompt goes out as a single user message. Empty completions are
    /// errors.
    #[instrument(skip(self, prompt, context), fields(provider = %self.provider.name(), prompt_len = prompt.len()))]
    pub async fn analyze(&self, prompt: &str, context: Option<&str>, model: &str) -> Result<String> {
        let request = CompletionRequest::builder(model)
            .add_message(Message::user(with_context(prompt, context)))
            .temperature(self.temperature)
            .build();

        let text = self.provider.complete_text(request).await?;
        debug!("Model returned {} characters", text.len());
        Ok(text)
    }
}

impl std::fmt::Debug for Analyst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyst")
            .field("provider", &self.provider.name())
            .field("temperature", &self.temperature)
            .finish()
    }
}
