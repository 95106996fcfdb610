//! TOML-based configuration for ragkit
//!
//! All deployment settings live in one file (`ragkit.toml` by default). Every
//! section and key is optional; a missing file yields the defaults. A few
//! keys can be overridden from the environment (see [`ENV_OVERRIDES`]).

use ragkit_vector::{CollectionSchema, DistanceMetric, IndexParams, DEFAULT_MAX_TEXT_BYTES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::rag::embeddings::EmbeddingModelType;
use crate::rag::retriever::{RankingPath, RetrieverConfig};
use crate::types::AppError;

/// Environment variables read by [`RagConfig::apply_env_overrides`].
pub const ENV_OVERRIDES: &[&str] = &[
    "RAGKIT_DATA_PATH",
    "RAGKIT_COLLECTION",
    "RAGKIT_OLLAMA_URL",
    "RAGKIT_OLLAMA_MODEL",
    "RAGKIT_LOG_LEVEL",
];

/// Root configuration structure loaded from ragkit.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub collection: CollectionConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub generation: GenerationConfig,
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ============= Store Configuration =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Data directory; in-memory when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Index searches fail with `NotLoaded` outside a load scope.
    #[serde(default)]
    pub require_load: bool,
}

// ============= Collection Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    #[serde(default = "default_collection_name")]
    pub name: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default)]
    pub metric: DistanceMetric,

    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: usize,
}

fn default_collection_name() -> String {
    "documents".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_max_text_bytes() -> usize {
    DEFAULT_MAX_TEXT_BYTES
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: default_collection_name(),
            dimensions: default_dimensions(),
            metric: DistanceMetric::default(),
            max_text_bytes: default_max_text_bytes(),
        }
    }
}

// ============= Index Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_m")]
    pub m: usize,

    #[serde(default = "default_ef_construction")]
    pub ef_construction: usize,

    #[serde(default = "default_ef_search")]
    pub ef_search: usize,
}

fn default_m() -> usize {
    IndexParams::default().m
}

fn default_ef_construction() -> usize {
    IndexParams::default().ef_construction
}

fn default_ef_search() -> usize {
    IndexParams::default().ef_search
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            m: default_m(),
            ef_construction: default_ef_construction(),
            ef_search: default_ef_search(),
        }
    }
}

// ============= Embedding Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local ONNX models through fastembed (`local-embeddings` feature).
    #[serde(rename = "fastembed")]
    FastEmbed,
    /// Feature hashing; no model download, lexical similarity only.
    Hash,
}

impl Default for EmbeddingProvider {
    fn default() -> Self {
        if cfg!(feature = "local-embeddings") {
            EmbeddingProvider::FastEmbed
        } else {
            EmbeddingProvider::Hash
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    /// Model name for the fastembed provider.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Query embedding cache entries; 0 disables the cache.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_embedding_model() -> String {
    EmbeddingModelType::default().name().to_string()
}

fn default_cache_size() -> usize {
    1024
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            model: default_embedding_model(),
            cache_size: default_cache_size(),
        }
    }
}

// ============= Retrieval Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub ranking: RankingPath,

    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_top_k() -> usize {
    crate::rag::pipeline::DEFAULT_TOP_K
}

fn default_max_context_chars() -> usize {
    crate::rag::pipeline::DEFAULT_MAX_CONTEXT_CHARS
}

fn default_separator() -> String {
    crate::rag::context::DEFAULT_SEPARATOR.to_string()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            ranking: RankingPath::default(),
            max_context_chars: default_max_context_chars(),
            separator: default_separator(),
        }
    }
}

// ============= Generation Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Prompt template with `{context}` and `{question}` placeholders.
    #[serde(default)]
    pub template: Option<String>,
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_generation_model() -> String {
    "llama3".to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_generation_model(),
            template: None,
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {0}: {1}")]
    ReadError(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl RagConfig {
    /// Load configuration from a TOML file, apply environment overrides and
    /// validate. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let content =
                fs::read_to_string(path).map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;
            Self::from_toml_str(&content)?
        } else {
            debug!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parse TOML without touching the environment or validating.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply the [`ENV_OVERRIDES`] using `lookup` to read variables.
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get("RAGKIT_DATA_PATH") {
            self.store.path = Some(PathBuf::from(path));
        }
        if let Some(name) = get("RAGKIT_COLLECTION") {
            self.collection.name = name;
        }
        if let Some(url) = get("RAGKIT_OLLAMA_URL") {
            self.generation.base_url = url;
        }
        if let Some(model) = get("RAGKIT_OLLAMA_MODEL") {
            self.generation.model = model;
        }
        if let Some(level) = get("RAGKIT_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "collection.name must not be empty".to_string(),
            ));
        }
        ragkit_vector::collection::validate_name(&self.collection.name)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.collection.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "collection.dimensions must be > 0".to_string(),
            ));
        }
        if self.collection.max_text_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "collection.max_text_bytes must be > 0".to_string(),
            ));
        }
        if self.index.m == 0 {
            return Err(ConfigError::ValidationError("index.m must be > 0".to_string()));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be > 0".to_string(),
            ));
        }
        if self.retrieval.max_context_chars == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.max_context_chars must be > 0".to_string(),
            ));
        }

        if self.embedding.provider == EmbeddingProvider::FastEmbed {
            let model: EmbeddingModelType = self
                .embedding
                .model
                .parse()
                .map_err(|e: AppError| ConfigError::ValidationError(e.to_string()))?;
            if model.dimensions() != self.collection.dimensions {
                return Err(ConfigError::ValidationError(format!(
                    "embedding model {} produces {} dimensions but collection.dimensions is {}",
                    model,
                    model.dimensions(),
                    self.collection.dimensions
                )));
            }
        }

        if let Some(template) = &self.generation.template {
            if !template.contains("{question}") {
                return Err(ConfigError::ValidationError(
                    "generation.template must contain {question}".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Schema for the configured collection.
    pub fn schema(&self) -> CollectionSchema {
        CollectionSchema::new(
            self.collection.name.clone(),
            self.collection.dimensions,
            self.collection.metric,
        )
        .with_max_text_bytes(self.collection.max_text_bytes)
    }

    /// Index build parameters.
    pub fn index_params(&self) -> IndexParams {
        IndexParams::default()
            .with_m(self.index.m)
            .with_ef_construction(self.index.ef_construction)
            .with_ef_search(self.index.ef_search)
    }

    /// Retriever settings for the configured collection.
    pub fn retriever_config(&self) -> RetrieverConfig {
        RetrieverConfig {
            collection: self.collection.name.clone(),
            metric: self.collection.metric,
            ranking: self.retrieval.ranking,
            ef_search: Some(self.index.ef_search),
        }
    }
}
