//! Mock implementations for testing.
//!
//! Mock generation clients and embedders shared by the integration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use ragkit::llm::LLMClient;
use ragkit::rag::embeddings::{normalize_text, prepare_inputs, Embedder};
use ragkit::types::{AppError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Mock LLM client with a canned response.
///
/// Records every prompt it receives so tests can inspect the rendered
/// template.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            should_fail: true,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        if self.should_fail {
            return Err(AppError::UpstreamGeneration {
                message: "Mock LLM failure".to_string(),
                passages: Vec::new(),
            });
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Embedder that looks vectors up in a fixed table.
///
/// Texts missing from the table fail with `Encoding`.
pub struct FixedEmbedder {
    dimensions: usize,
    table: HashMap<String, Vec<f32>>,
    calls: Mutex<usize>,
}

impl FixedEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            table: HashMap::new(),
            calls: Mutex::new(0),
        }
    }

    /// Map `text` (after normalization) to `vector`.
    pub fn with(mut self, text: &str, vector: &[f32]) -> Self {
        self.table.insert(normalize_text(text), vector.to_vec());
        self
    }

    /// Number of `embed` calls made.
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        *self.calls.lock() += 1;
        prepare_inputs(texts)?
            .iter()
            .map(|text| {
                self.table
                    .get(text)
                    .cloned()
                    .ok_or_else(|| AppError::Encoding(format!("no vector for {:?}", text)))
            })
            .collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "fixed-table"
    }
}

/// Embedder whose model never loads.
pub struct FailingEmbedder {
    pub dimensions: usize,
}

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(AppError::ModelUnavailable("mock model missing".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}
