//! Text embedding.
//!
//! Every embedder normalizes its input the same way before encoding: leading
//! and trailing whitespace is trimmed and internal whitespace runs collapse to
//! one space. A text that is empty after normalization is rejected.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "local-embeddings")]
use parking_lot::Mutex;
#[cfg(feature = "local-embeddings")]
use std::sync::Arc;

/// Maps text to fixed-length vectors.
///
/// Output order and length match the input; each vector has exactly
/// [`Embedder::dimensions`] entries. Identical input and model produce
/// identical output.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::Encoding("embedder returned no vector".to_string()))
    }

    /// Length of every produced vector.
    fn dimensions(&self) -> usize;

    /// Model identifier, used in cache keys and logs.
    fn model_name(&self) -> &str;
}

/// Trim and collapse internal whitespace runs to a single space.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a batch, rejecting it whole if any text is empty afterwards.
pub fn prepare_inputs(texts: &[String]) -> Result<Vec<String>> {
    texts
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let normalized = normalize_text(text);
            if normalized.is_empty() {
                Err(AppError::InvalidArgument(format!(
                    "text at index {} is empty",
                    index
                )))
            } else {
                Ok(normalized)
            }
        })
        .collect()
}

// ============================================================================
// Model catalogue
// ============================================================================

/// Sentence-transformer models available to the local embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingModelType {
    /// sentence-transformers/all-MiniLM-L6-v2 (384 dims)
    #[default]
    AllMiniLmL6V2,
    /// sentence-transformers/all-MiniLM-L12-v2 (384 dims)
    AllMiniLmL12V2,
    /// BAAI/bge-small-en-v1.5 (384 dims)
    BgeSmallEnV15,
    /// BAAI/bge-base-en-v1.5 (768 dims)
    BgeBaseEnV15,
    /// nomic-ai/nomic-embed-text-v1.5 (768 dims)
    NomicEmbedTextV15,
}

impl EmbeddingModelType {
    /// Output dimensionality.
    pub fn dimensions(&self) -> usize {
        match self {
            EmbeddingModelType::AllMiniLmL6V2
            | EmbeddingModelType::AllMiniLmL12V2
            | EmbeddingModelType::BgeSmallEnV15 => 384,
            EmbeddingModelType::BgeBaseEnV15 | EmbeddingModelType::NomicEmbedTextV15 => 768,
        }
    }

    /// Canonical configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            EmbeddingModelType::AllMiniLmL6V2 => "all-minilm-l6-v2",
            EmbeddingModelType::AllMiniLmL12V2 => "all-minilm-l12-v2",
            EmbeddingModelType::BgeSmallEnV15 => "bge-small-en-v1.5",
            EmbeddingModelType::BgeBaseEnV15 => "bge-base-en-v1.5",
            EmbeddingModelType::NomicEmbedTextV15 => "nomic-embed-text-v1.5",
        }
    }

    #[cfg(feature = "local-embeddings")]
    fn to_fastembed(self) -> fastembed::EmbeddingModel {
        use fastembed::EmbeddingModel;
        match self {
            EmbeddingModelType::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
            EmbeddingModelType::AllMiniLmL12V2 => EmbeddingModel::AllMiniLML12V2,
            EmbeddingModelType::BgeSmallEnV15 => EmbeddingModel::BGESmallENV15,
            EmbeddingModelType::BgeBaseEnV15 => EmbeddingModel::BGEBaseENV15,
            EmbeddingModelType::NomicEmbedTextV15 => EmbeddingModel::NomicEmbedTextV15,
        }
    }
}

impl fmt::Display for EmbeddingModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EmbeddingModelType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.to_lowercase();
        let bare = lowered
            .trim_start_matches("sentence-transformers/")
            .trim_start_matches("baai/")
            .trim_start_matches("nomic-ai/");
        match bare {
            "all-minilm-l6-v2" => Ok(EmbeddingModelType::AllMiniLmL6V2),
            "all-minilm-l12-v2" => Ok(EmbeddingModelType::AllMiniLmL12V2),
            "bge-small-en-v1.5" => Ok(EmbeddingModelType::BgeSmallEnV15),
            "bge-base-en-v1.5" => Ok(EmbeddingModelType::BgeBaseEnV15),
            "nomic-embed-text-v1.5" => Ok(EmbeddingModelType::NomicEmbedTextV15),
            _ => Err(AppError::Configuration(format!(
                "Unknown embedding model: {}",
                s
            ))),
        }
    }
}

// ============================================================================
// FastEmbed (local ONNX models)
// ============================================================================

/// Local sentence-transformer embedder backed by fastembed.
///
/// Inference runs on the blocking thread pool.
#[cfg(feature = "local-embeddings")]
pub struct FastEmbedEmbedder {
    model: Arc<Mutex<fastembed::TextEmbedding>>,
    model_type: EmbeddingModelType,
}

#[cfg(feature = "local-embeddings")]
impl FastEmbedEmbedder {
    /// Load a model, downloading it on first use.
    pub fn new(model_type: EmbeddingModelType) -> Result<Self> {
        use fastembed::{InitOptions, TextEmbedding};

        let model = TextEmbedding::try_new(
            InitOptions::new(model_type.to_fastembed()).with_show_download_progress(true),
        )
        .map_err(|e| AppError::ModelUnavailable(format!("{}: {}", model_type, e)))?;

        tracing::info!(model = %model_type, dimensions = model_type.dimensions(), "Loaded embedding model");

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_type,
        })
    }
}

#[cfg(feature = "local-embeddings")]
#[async_trait]
impl Embedder for FastEmbedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let inputs = prepare_inputs(texts)?;
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let expected = inputs.len();
        let vectors = tokio::task::spawn_blocking(move || model.lock().embed(inputs, None))
            .await
            .map_err(|e| AppError::Encoding(format!("embedding task failed: {}", e)))?
            .map_err(|e| AppError::Encoding(e.to_string()))?;

        if vectors.len() != expected {
            return Err(AppError::Encoding(format!(
                "model returned {} vectors for {} texts",
                vectors.len(),
                expected
            )));
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.model_type.dimensions()
    }

    fn model_name(&self) -> &str {
        self.model_type.name()
    }
}

// ============================================================================
// Feature hashing
// ============================================================================

/// Deterministic signed feature-hashing embedder.
///
/// Lower-cased alphanumeric tokens are hashed into `dimensions` buckets with
/// a hash-derived sign, then the vector is L2-normalized. Needs no model
/// download, so it serves offline deployments and tests.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
    name: String,
}

impl HashEmbedder {
    /// Create a hashing embedder. `dimensions` must be > 0.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(AppError::Configuration(
                "hash embedder dimensions must be > 0".to_string(),
            ));
        }
        Ok(Self {
            dimensions,
            name: format!("feature-hash-{}", dimensions),
        })
    }

    fn add_token(&self, vector: &mut [f32], token: &str) {
        let digest = Sha256::digest(token.as_bytes());
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign;
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let mut vector = vec![0.0f32; self.dimensions];

        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            self.add_token(&mut vector, token);
        }

        // No token, or tokens that cancelled out: hash the whole text instead.
        if vector.iter().all(|v| *v == 0.0) {
            self.add_token(&mut vector, &lowered);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        for v in vector.iter_mut() {
            *v /= norm;
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let inputs = prepare_inputs(texts)?;
        Ok(inputs.iter().map(|text| self.encode(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        ragkit_vector::DistanceMetric::Cosine.similarity(a, b)
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  hello \n\t world  "), "hello world");
        assert_eq!(normalize_text(" \n "), "");
    }

    #[test]
    fn test_prepare_inputs_rejects_whole_batch() {
        let texts = vec!["fine".to_string(), "   ".to_string()];
        let err = prepare_inputs(&texts).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(msg) if msg.contains("index 1")));
    }

    #[test]
    fn test_model_type_parsing() {
        assert_eq!(
            "all-MiniLM-L6-v2".parse::<EmbeddingModelType>().unwrap(),
            EmbeddingModelType::AllMiniLmL6V2
        );
        assert_eq!(
            "BAAI/bge-base-en-v1.5".parse::<EmbeddingModelType>().unwrap(),
            EmbeddingModelType::BgeBaseEnV15
        );
        assert_eq!(EmbeddingModelType::default().dimensions(), 384);
        assert!("word2vec".parse::<EmbeddingModelType>().is_err());
    }

    #[tokio::test]
    async fn test_hash_embedder_shape_and_determinism() {
        let embedder = HashEmbedder::new(64).unwrap();
        let texts = vec!["The cat sat".to_string(), "on the mat".to_string()];

        let first = embedder.embed(&texts).await.unwrap();
        let second = embedder.embed(&texts).await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|v| v.len() == 64));
        assert_eq!(first, second);

        let norm: f32 = first[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_hash_embedder_normalizes_input() {
        let embedder = HashEmbedder::new(32).unwrap();
        let a = embedder.embed_one("Hello   World").await.unwrap();
        let b = embedder.embed_one("  hello world ").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_hash_embedder_similarity() {
        let embedder = HashEmbedder::new(256).unwrap();
        let base = embedder.embed_one("rust borrow checker lifetimes").await.unwrap();
        let close = embedder.embed_one("the rust borrow checker").await.unwrap();
        let far = embedder.embed_one("banana bread recipe").await.unwrap();
        assert!(cosine(&base, &close) > cosine(&base, &far));
        assert!((cosine(&base, &base) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_hash_embedder_punctuation_only() {
        let embedder = HashEmbedder::new(16).unwrap();
        let v = embedder.embed_one("?!").await.unwrap();
        assert!(v.iter().any(|x| *x != 0.0));
    }

    #[tokio::test]
    async fn test_hash_embedder_rejects_empty() {
        let embedder = HashEmbedder::new(16).unwrap();
        let err = embedder.embed_one("   ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert!(HashEmbedder::new(0).is_err());
    }
}
