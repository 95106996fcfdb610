//! Generation client abstraction.

use crate::types::Result;
use async_trait::async_trait;

/// Text generation service used to answer a question from assembled context.
///
/// Implementations report failures as
/// [`AppError::UpstreamGeneration`](crate::types::AppError::UpstreamGeneration);
/// the pipeline attaches the retrieved passages before surfacing the error.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Provider selection for generation.
#[derive(Debug, Clone)]
pub enum Provider {
    /// Ollama local LLM provider
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Ollama {
    ///     base_url: "http://localhost:11434".to_string(),
    ///     model: "llama3".to_string(),
    /// };
    /// ```
    #[cfg(feature = "ollama")]
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Create an LLM client for this provider
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            #[cfg(feature = "ollama")]
            Provider::Ollama { base_url, model } => Ok(Box::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone())?,
            )),
            #[allow(unreachable_patterns)]
            _ => Err(crate::types::AppError::Configuration(
                "no generation provider compiled in; enable the `ollama` feature".to_string(),
            )),
        }
    }
}
