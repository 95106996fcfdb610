//! Error types for ragkit-vector.

use crate::distance::DistanceMetric;
use thiserror::Error;

/// Result type for ragkit-vector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ragkit-vector operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Collection already exists.
    #[error("Collection '{0}' already exists")]
    CollectionExists(String),

    /// Collection not found.
    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    /// A document in an insert batch has the wrong number of dimensions.
    ///
    /// The whole batch is rejected; `index` is the position of the first
    /// offending document.
    #[error("Dimension mismatch at batch index {index}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Position of the offending document in the batch.
        index: usize,
        /// Collection dimensions.
        expected: usize,
        /// Dimensions of the rejected vector.
        actual: usize,
    },

    /// A query vector has the wrong number of dimensions.
    #[error("Query dimension mismatch: expected {expected}, got {actual}")]
    QueryDimensionMismatch {
        /// Collection dimensions.
        expected: usize,
        /// Query dimensions.
        actual: usize,
    },

    /// Invalid vector in an insert batch (NaN, infinite, or zero under cosine).
    #[error("Invalid vector at batch index {index}: {reason}")]
    InvalidVector {
        /// Position of the offending document in the batch.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// Document text exceeds the collection's bound.
    #[error("Text at batch index {index} is {actual} bytes, limit is {max}")]
    TextTooLong {
        /// Position of the offending document in the batch.
        index: usize,
        /// Collection limit in bytes.
        max: usize,
        /// Actual text length in bytes.
        actual: usize,
    },

    /// Query vector has zero magnitude under a metric that needs a direction.
    #[error("Degenerate query vector: {0}")]
    DegenerateVector(String),

    /// Invalid argument (zero `k`, empty name, zero dimensions).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Index metric disagrees with the collection metric.
    #[error("Metric mismatch on '{collection}': collection uses {expected}, requested {actual}")]
    MetricMismatch {
        /// Collection name.
        collection: String,
        /// Collection metric.
        expected: DistanceMetric,
        /// Requested metric.
        actual: DistanceMetric,
    },

    /// The collection has no visible documents.
    #[error("Collection '{0}' is empty")]
    CollectionEmpty(String),

    /// The store requires a load scope and none is active.
    #[error("Collection '{0}' is not loaded")]
    NotLoaded(String),

    /// Another write was published while this one was being prepared.
    #[error("Collection '{0}' changed during the write; retry")]
    Conflict(String),

    /// Index error during HNSW operations.
    #[error("Index error: {0}")]
    Index(String),

    /// Persistence error (serialization, layout).
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
