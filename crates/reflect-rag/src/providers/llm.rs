//! Language model provider trait

use async_trait::async_trait;
use crate::error::Result;

/// Trait for text completion against a hosted or local model
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server
/// - `GroqLlm`: Groq OpenAI-compatible chat completions
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a fully rendered prompt
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
