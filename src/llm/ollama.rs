use crate::llm::client::LLMClient;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
};
use tracing::debug;

/// Default Ollama port when the base URL omits one.
pub const DEFAULT_PORT: u16 = 11434;

pub struct OllamaClient {
    client: Ollama,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Split a base URL into `scheme://host` and port.
///
/// A missing scheme means `http`; a missing port means [`DEFAULT_PORT`].
pub fn parse_base_url(base_url: &str) -> Result<(String, u16)> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let (scheme, rest) = match trimmed.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", trimmed),
    };
    if scheme != "http" && scheme != "https" {
        return Err(AppError::Configuration(format!(
            "unsupported scheme in Ollama URL: {}",
            base_url
        )));
    }

    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| {
                AppError::Configuration(format!("invalid port in Ollama URL: {}", base_url))
            })?;
            (host, port)
        }
        None => (rest, DEFAULT_PORT),
    };
    if host.is_empty() || host.contains('/') {
        return Err(AppError::Configuration(format!(
            "invalid host in Ollama URL: {}",
            base_url
        )));
    }

    Ok((format!("{}://{}", scheme, host), port))
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Result<Self> {
        let (host, port) = parse_base_url(&base_url)?;
        if model.trim().is_empty() {
            return Err(AppError::Configuration(
                "generation model must not be empty".to_string(),
            ));
        }

        let client = Ollama::new(host, port);

        Ok(Self {
            client,
            model,
            base_url,
        })
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let messages = vec![ChatMessage::user(prompt.to_string())];

        let request = ChatMessageRequest::new(self.model.clone(), messages);

        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "Sending chat request");
        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::UpstreamGeneration {
                message: format!("Ollama error: {}", e),
                passages: Vec::new(),
            })?;

        Ok(response.message.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
