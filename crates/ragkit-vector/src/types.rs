//! Common types for ragkit-vector.

use crate::config::IndexParams;
use crate::distance::DistanceMetric;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default bound on document text, in UTF-8 bytes.
pub const DEFAULT_MAX_TEXT_BYTES: usize = 65_535;

/// Store-assigned document identifier.
///
/// Monotonic per collection and never reused, so ordering by id is
/// insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl DocumentId {
    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DocumentId {
    fn from(id: u64) -> Self {
        DocumentId(id)
    }
}

/// Insert payload: a passage and its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    /// Passage text.
    pub text: String,
    /// Embedding of `text`.
    pub vector: Vec<f32>,
}

impl NewDocument {
    /// Create a new insert payload.
    pub fn new(text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            vector,
        }
    }
}

/// A document as held by a collection. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Assigned identifier.
    pub id: DocumentId,
    /// Passage text.
    pub text: String,
    /// Embedding, exactly `dimensions` long.
    pub vector: Vec<f32>,
    /// When the document was staged.
    pub inserted_at: DateTime<Utc>,
}

/// Result of a vector search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    /// ID of the matched document.
    pub id: DocumentId,
    /// Passage text.
    pub text: String,
    /// Similarity score (higher = more similar for every metric).
    pub score: f32,
}

/// Outcome of [`crate::VectorDb::build_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexBuild {
    /// An index with identical parameters already covered every visible document.
    Unchanged,
    /// The index was built or replaced.
    Built {
        /// Number of documents indexed.
        documents: usize,
    },
}

/// Fixed description of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Collection name.
    pub name: String,
    /// Vector dimensionality.
    pub dimensions: usize,
    /// Similarity metric.
    pub metric: DistanceMetric,
    /// Maximum text length in UTF-8 bytes.
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: usize,
}

fn default_max_text_bytes() -> usize {
    DEFAULT_MAX_TEXT_BYTES
}

impl CollectionSchema {
    /// Create a schema with the default text bound.
    pub fn new(name: impl Into<String>, dimensions: usize, metric: DistanceMetric) -> Self {
        Self {
            name: name.into(),
            dimensions,
            metric,
            max_text_bytes: DEFAULT_MAX_TEXT_BYTES,
        }
    }

    /// Override the text bound.
    pub fn with_max_text_bytes(mut self, max: usize) -> Self {
        self.max_text_bytes = max;
        self
    }
}

/// Statistics about a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Collection name.
    pub name: String,
    /// Vector dimensions.
    pub dimensions: usize,
    /// Distance metric.
    pub metric: DistanceMetric,
    /// Visible documents.
    pub document_count: usize,
    /// Staged documents awaiting `flush`.
    pub pending_count: usize,
    /// Parameters of the current index, if any.
    pub index: Option<IndexParams>,
    /// Active load scopes.
    pub loads: usize,
    /// Text bound in bytes.
    pub max_text_bytes: usize,
}
