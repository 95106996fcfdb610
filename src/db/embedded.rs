//! Embedded vector store backed by `ragkit-vector`.
//!
//! # Features
//!
//! - **No native dependencies**: pure-Rust HNSW, no separate server
//! - **Persistent**: optional JSON persistence under a data directory
//! - **Snapshot reads**: searches never observe a half-applied flush
//!
//! # Example
//!
//! ```rust,ignore
//! let store = EmbeddedVectorStore::new(Some("./data/vectors".into()), false).await?;
//! store.create_collection(CollectionSchema::new("documents", 384, DistanceMetric::Cosine)).await?;
//! let ids = store.insert("documents", &docs).await?;
//! store.flush("documents").await?;
//! ```

use crate::types::Result;
use async_trait::async_trait;
use std::path::PathBuf;

use super::vectorstore::VectorStore;
use ragkit_vector::{
    CollectionSchema, CollectionStats, Config, DistanceMetric, DocumentId, IndexBuild,
    IndexParams, LoadGuard, NewDocument, ScoredResult, SearchParams, StoredDocument, VectorDb,
};

/// Vector store over an embedded [`VectorDb`].
#[derive(Debug, Clone)]
pub struct EmbeddedVectorStore {
    /// The underlying vector database (VectorDb is Clone and uses Arc internally)
    db: VectorDb,
}

impl EmbeddedVectorStore {
    /// Open the store.
    ///
    /// # Arguments
    ///
    /// * `path` - Optional path to persist data. If None, operates in-memory.
    /// * `require_load` - Searches fail with `NotLoaded` outside a load scope.
    pub async fn new(path: Option<PathBuf>, require_load: bool) -> Result<Self> {
        let config = match path {
            Some(p) => Config::persistent(p),
            None => Config::memory(),
        }
        .with_require_load(require_load);

        let db = VectorDb::open(config).await?;
        Ok(Self { db })
    }

    /// In-memory store without load gating.
    pub async fn in_memory() -> Result<Self> {
        Self::new(None, false).await
    }

    /// Wrap an already opened database.
    pub fn with_db(db: VectorDb) -> Self {
        Self { db }
    }

    /// The underlying database.
    pub fn db(&self) -> &VectorDb {
        &self.db
    }
}

#[async_trait]
impl VectorStore for EmbeddedVectorStore {
    fn provider_name(&self) -> &'static str {
        "embedded"
    }

    async fn create_collection(&self, schema: CollectionSchema) -> Result<()> {
        Ok(self.db.create_collection(schema).await?)
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        Ok(self.db.drop_collection(name).await?)
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.db.collection_exists(name))
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self.db.list_collections())
    }

    async fn describe(&self, name: &str) -> Result<CollectionStats> {
        Ok(self.db.collection_stats(name)?)
    }

    async fn insert(&self, collection: &str, documents: &[NewDocument]) -> Result<Vec<DocumentId>> {
        Ok(self.db.insert(collection, documents)?)
    }

    async fn flush(&self, collection: &str) -> Result<usize> {
        Ok(self.db.flush(collection).await?)
    }

    async fn build_index(
        &self,
        collection: &str,
        metric: DistanceMetric,
        params: IndexParams,
    ) -> Result<IndexBuild> {
        Ok(self.db.build_index(collection, metric, params).await?)
    }

    async fn drop_index(&self, collection: &str) -> Result<bool> {
        Ok(self.db.drop_index(collection).await?)
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
        params: SearchParams,
    ) -> Result<Vec<ScoredResult>> {
        Ok(self.db.search(collection, query, k, params)?)
    }

    async fn scan(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        Ok(self.db.scan(collection)?)
    }

    async fn delete(&self, collection: &str, ids: &[DocumentId]) -> Result<usize> {
        Ok(self.db.delete(collection, ids).await?)
    }

    async fn load(&self, collection: &str) -> Result<LoadGuard> {
        Ok(self.db.load(collection)?)
    }
}
