//! Vector Store Abstraction Layer
//!
//! The retriever and the RAG pipeline talk to the store only through the
//! [`VectorStore`] trait, so they can be handed any backend as
//! `Arc<dyn VectorStore>`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      VectorStore Trait                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │ create │ insert │ flush │ build_index │ search │ scan │ load │
//! └─────────────────────────────────────────────────────────────┘
//!                              ▲
//!                              │
//!                   ┌──────────┴──────────┐
//!                   │ EmbeddedVectorStore │
//!                   │  (ragkit-vector)    │
//!                   └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use ragkit::db::vectorstore::{VectorStore, VectorStoreProvider};
//!
//! let store = VectorStoreProvider::Embedded {
//!     path: Some("./data/vectors".into()),
//!     require_load: false,
//! }.create_store().await?;
//!
//! store.create_collection(CollectionSchema::new("documents", 384, DistanceMetric::Cosine)).await?;
//! store.insert("documents", &documents).await?;
//! store.flush("documents").await?;
//! let results = store.search("documents", &query, 3, SearchParams::default()).await?;
//! ```

use crate::types::Result;
use async_trait::async_trait;
use ragkit_vector::{
    CollectionSchema, CollectionStats, DistanceMetric, DocumentId, IndexBuild, IndexParams,
    LoadGuard, NewDocument, ScoredResult, SearchParams, StoredDocument,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

// ============================================================================
// Vector Store Provider Configuration
// ============================================================================

/// Configuration for vector store providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum VectorStoreProvider {
    /// Embedded HNSW store from `ragkit-vector`.
    ///
    /// No separate server process. Data persisted under `path` when set.
    Embedded {
        /// Path to the data directory (None for in-memory).
        path: Option<PathBuf>,
        /// Searches require an active load scope.
        #[serde(default)]
        require_load: bool,
    },
}

impl VectorStoreProvider {
    /// Create a vector store instance from this provider configuration.
    pub async fn create_store(&self) -> Result<Arc<dyn VectorStore>> {
        match self {
            VectorStoreProvider::Embedded { path, require_load } => {
                let store = super::embedded::EmbeddedVectorStore::new(path.clone(), *require_load).await?;
                Ok(Arc::new(store))
            }
        }
    }
}

// ============================================================================
// Vector Store Trait
// ============================================================================

/// Abstract trait for vector database operations.
///
/// Inserted documents are staged and only become visible to `search` and
/// `scan` after `flush`.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Get the name of this vector store provider.
    fn provider_name(&self) -> &'static str;

    /// Create a new, empty collection with a fixed schema.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if the name is taken; `InvalidArgument` for an empty
    /// name or zero dimensions.
    async fn create_collection(&self, schema: CollectionSchema) -> Result<()>;

    /// Delete a collection and all its data, including persisted files.
    async fn drop_collection(&self, name: &str) -> Result<()>;

    /// Check if a collection exists.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// List all collection names.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Schema, counts, index parameters and load count of a collection.
    async fn describe(&self, name: &str) -> Result<CollectionStats>;

    /// Stage a batch of documents.
    ///
    /// All-or-nothing: the whole batch is validated first and the first
    /// offending item is reported with its batch index.
    async fn insert(&self, collection: &str, documents: &[NewDocument]) -> Result<Vec<DocumentId>>;

    /// Make staged documents visible (and durable for persistent stores).
    ///
    /// Returns the number of documents made visible.
    async fn flush(&self, collection: &str) -> Result<usize>;

    /// Build or replace the collection's index.
    ///
    /// `metric` must equal the collection metric.
    async fn build_index(
        &self,
        collection: &str,
        metric: DistanceMetric,
        params: IndexParams,
    ) -> Result<IndexBuild>;

    /// Drop the index; searches revert to exhaustive scoring.
    async fn drop_index(&self, collection: &str) -> Result<bool>;

    /// At most `k` results, best first, ties in insertion order.
    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
        params: SearchParams,
    ) -> Result<Vec<ScoredResult>>;

    /// All visible documents in insertion order.
    async fn scan(&self, collection: &str) -> Result<Vec<StoredDocument>>;

    /// Delete documents by id. Returns the number actually removed.
    async fn delete(&self, collection: &str, ids: &[DocumentId]) -> Result<usize>;

    /// Open a load scope; the collection stays loaded while the guard lives.
    async fn load(&self, collection: &str) -> Result<LoadGuard>;

    /// End a load scope.
    fn release(&self, guard: LoadGuard) {
        guard.release();
    }
}
