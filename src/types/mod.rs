use ragkit_vector::DocumentId;
use serde::{Deserialize, Serialize};

// ============= Retrieval Types =============

/// A passage handed back by the retriever, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub id: DocumentId,
    pub text: String,
    /// Similarity under the collection metric; higher is more similar.
    pub score: f32,
}

impl From<ragkit_vector::ScoredResult> for RetrievedPassage {
    fn from(result: ragkit_vector::ScoredResult) -> Self {
        Self {
            id: result.id,
            text: result.text,
            score: result.score,
        }
    }
}

/// A generated answer together with the passages it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    pub passages: Vec<RetrievedPassage>,
    pub model: String,
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// Ids assigned to the ingested texts, in input order.
    pub inserted: Vec<DocumentId>,
}

// ============= Error Types =============

/// Coarse error classes a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request itself is wrong; retrying it unchanged will fail again.
    BadInput,
    /// Nothing to retrieve yet. Recoverable by ingesting data.
    NoData,
    /// A model or the store cannot serve the request right now.
    Unavailable,
    /// Deployment is misconfigured. Fatal, not retried.
    Configuration,
    /// The generation service failed.
    Upstream,
}

impl ErrorKind {
    /// Process exit code used by the CLI.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::BadInput => 2,
            ErrorKind::NoData => 3,
            ErrorKind::Unavailable => 4,
            ErrorKind::Configuration => 5,
            ErrorKind::Upstream => 6,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Dimension mismatch at batch index {index}: expected {expected}, got {actual}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Degenerate vector: {0}")]
    DegenerateVector(String),

    #[error("No documents available in collection '{0}'")]
    NoDocumentsAvailable(String),

    #[error("Collection '{0}' is not loaded")]
    NotLoaded(String),

    /// Generation failed after retrieval succeeded; the passages are kept.
    #[error("Generation failed: {message}")]
    UpstreamGeneration {
        message: String,
        passages: Vec<RetrievedPassage>,
    },

    #[error("Store error: {0}")]
    Store(String),
}

impl AppError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Configuration(_) => ErrorKind::Configuration,
            AppError::ModelUnavailable(_) | AppError::NotLoaded(_) | AppError::Store(_) => {
                ErrorKind::Unavailable
            }
            AppError::Encoding(_)
            | AppError::InvalidArgument(_)
            | AppError::AlreadyExists(_)
            | AppError::DimensionMismatch { .. }
            | AppError::InvalidDocument(_)
            | AppError::DegenerateVector(_) => ErrorKind::BadInput,
            AppError::NoDocumentsAvailable(_) => ErrorKind::NoData,
            AppError::UpstreamGeneration { .. } => ErrorKind::Upstream,
        }
    }
}

impl From<ragkit_vector::Error> for AppError {
    fn from(err: ragkit_vector::Error) -> Self {
        use ragkit_vector::Error as E;
        match err {
            E::CollectionExists(name) => {
                AppError::AlreadyExists(format!("collection '{}'", name))
            }
            E::CollectionNotFound(name) => {
                AppError::Configuration(format!("collection '{}' does not exist", name))
            }
            E::DimensionMismatch {
                index,
                expected,
                actual,
            } => AppError::DimensionMismatch {
                index,
                expected,
                actual,
            },
            e @ E::QueryDimensionMismatch { .. } => AppError::Configuration(e.to_string()),
            e @ (E::InvalidVector { .. } | E::TextTooLong { .. }) => {
                AppError::InvalidDocument(e.to_string())
            }
            E::DegenerateVector(msg) => AppError::DegenerateVector(msg),
            E::InvalidArgument(msg) => AppError::InvalidArgument(msg),
            e @ E::MetricMismatch { .. } => AppError::Configuration(e.to_string()),
            E::CollectionEmpty(name) => AppError::NoDocumentsAvailable(name),
            E::NotLoaded(name) => AppError::NotLoaded(name),
            e @ (E::Index(_) | E::Persistence(_) | E::Io(_) | E::Conflict(_)) => {
                AppError::Store(e.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ragkit_vector::DistanceMetric;

    #[test]
    fn test_vector_errors_map_to_kinds() {
        let cases: Vec<(ragkit_vector::Error, ErrorKind)> = vec![
            (ragkit_vector::Error::CollectionExists("a".into()), ErrorKind::BadInput),
            (ragkit_vector::Error::CollectionNotFound("a".into()), ErrorKind::Configuration),
            (
                ragkit_vector::Error::MetricMismatch {
                    collection: "a".into(),
                    expected: DistanceMetric::Cosine,
                    actual: DistanceMetric::Euclidean,
                },
                ErrorKind::Configuration,
            ),
            (ragkit_vector::Error::CollectionEmpty("a".into()), ErrorKind::NoData),
            (ragkit_vector::Error::NotLoaded("a".into()), ErrorKind::Unavailable),
            (
                ragkit_vector::Error::TextTooLong {
                    index: 0,
                    max: 1,
                    actual: 2,
                },
                ErrorKind::BadInput,
            ),
            (ragkit_vector::Error::Persistence("disk".into()), ErrorKind::Unavailable),
            (ragkit_vector::Error::Conflict("a".into()), ErrorKind::Unavailable),
        ];

        for (err, kind) in cases {
            let app: AppError = err.into();
            assert_eq!(app.kind(), kind, "{app}");
        }
    }

    #[test]
    fn test_dimension_mismatch_keeps_index() {
        let app: AppError = ragkit_vector::Error::DimensionMismatch {
            index: 4,
            expected: 384,
            actual: 3,
        }
        .into();
        assert!(matches!(
            app,
            AppError::DimensionMismatch {
                index: 4,
                expected: 384,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let kinds = [
            ErrorKind::BadInput,
            ErrorKind::NoData,
            ErrorKind::Unavailable,
            ErrorKind::Configuration,
            ErrorKind::Upstream,
        ];
        let mut codes: Vec<i32> = kinds.iter().map(|k| k.exit_code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }
}
