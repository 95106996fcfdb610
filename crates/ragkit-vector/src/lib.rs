//! # ragkit-vector
//!
//! A pure-Rust embedded vector store for retrieval-augmented generation, with
//! HNSW (Hierarchical Navigable Small World) indexing.
//!
//! ## Features
//!
//! - **Batch inserts**: all-or-nothing validation, store-assigned monotonic ids
//! - **Flush visibility**: inserted documents become searchable only after `flush`
//! - **Optional HNSW index**: built explicitly, kept in sync on every flush and delete
//! - **Load scopes**: reference-counted RAII guards gating search when required
//! - **Persistence**: JSON files under a data directory, atomically replaced
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ragkit_vector::{CollectionSchema, Config, DistanceMetric, NewDocument, SearchParams, VectorDb};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ragkit_vector::Error> {
//!     let db = VectorDb::open(Config::memory()).await?;
//!     db.create_collection(CollectionSchema::new("documents", 384, DistanceMetric::Cosine)).await?;
//!
//!     let ids = db.insert("documents", &[NewDocument::new("hello", vec![0.1f32; 384])])?;
//!     db.flush("documents").await?;
//!
//!     let results = db.search("documents", &vec![0.1f32; 384], 3, SearchParams::default())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        VectorDb                          │
//! │  scc::HashMap<String, Arc<Collection>>                   │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │                   Collection                       │  │
//! │  │  pending buffer ──flush──▶ Arc<Segment>            │  │
//! │  │                            ├─ documents            │  │
//! │  │                            └─ Option<HnswIndex>    │  │
//! │  │  load count (LoadGuard)                            │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │  Persistence: collections.json, {name}/manifest.json,    │
//! │               {name}/documents.json                      │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod config;
pub mod distance;
pub mod error;
pub mod index;
pub mod persistence;
pub mod types;

// Re-exports for convenience
pub use collection::{rank_documents, Collection, LoadGuard, StagedSegment};
pub use config::{Config, IndexParams, SearchParams};
pub use distance::DistanceMetric;
pub use error::{Error, Result};
pub use types::{
    CollectionSchema, CollectionStats, DocumentId, IndexBuild, NewDocument, ScoredResult,
    StoredDocument, DEFAULT_MAX_TEXT_BYTES,
};

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// The main vector database instance.
///
/// `VectorDb` manages multiple collections, each holding documents of a
/// specific dimensionality. Cloning is cheap and every clone shares state.
///
/// # Thread Safety
///
/// Collections live in an `scc::HashMap`, which is safe to use across
/// `.await` points. Writes to one collection are serialized by the
/// collection itself; reads run against immutable snapshots.
#[derive(Clone)]
pub struct VectorDb {
    inner: Arc<VectorDbInner>,
}

struct VectorDbInner {
    config: Config,
    collections: scc::HashMap<String, Arc<Collection>>,
    /// Serializes disk writes.
    disk: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for VectorDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorDb")
            .field("config", &self.inner.config)
            .field("collections", &self.list_collections())
            .finish()
    }
}

impl VectorDb {
    /// Open or create a vector database with the given configuration.
    ///
    /// A persistent database restores every collection listed in its
    /// catalog. Collections that fail to load are skipped with a warning.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// // In-memory database
    /// let db = VectorDb::open(Config::memory()).await?;
    ///
    /// // Persistent database
    /// let db = VectorDb::open(Config::persistent("./data/vectors")).await?;
    /// ```
    #[instrument(skip(config), fields(persistent = config.data_path.is_some()))]
    pub async fn open(config: Config) -> Result<Self> {
        info!("Opening vector database");

        let db = Self {
            inner: Arc::new(VectorDbInner {
                config: config.clone(),
                collections: scc::HashMap::new(),
                disk: tokio::sync::Mutex::new(()),
            }),
        };

        if let Some(ref path) = config.data_path {
            db.load_collections(path).await?;
        }

        Ok(db)
    }

    /// Get the database configuration.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Create a new, empty collection.
    ///
    /// # Errors
    ///
    /// `CollectionExists` if the name is taken, `InvalidArgument` for an empty
    /// or unsafe name or zero dimensions.
    #[instrument(skip(self, schema), fields(name = %schema.name, dimensions = schema.dimensions, metric = %schema.metric))]
    pub async fn create_collection(&self, schema: CollectionSchema) -> Result<()> {
        info!("Creating collection");

        let name = schema.name.clone();
        if self.inner.collections.contains(&name) {
            return Err(Error::CollectionExists(name));
        }

        let collection = Arc::new(Collection::new(schema, self.inner.config.require_load)?);

        // Insert returns Err if key already exists (handles race condition)
        if self
            .inner
            .collections
            .insert(name.clone(), collection.clone())
            .is_err()
        {
            return Err(Error::CollectionExists(name));
        }

        if let Some(ref path) = self.inner.config.data_path {
            let _disk = self.inner.disk.lock().await;
            persistence::save_collection(path, &collection).await?;
            persistence::save_catalog(path, &self.list_collections()).await?;
        }

        Ok(())
    }

    /// Drop a collection and all its data, including persisted files.
    #[instrument(skip(self))]
    pub async fn drop_collection(&self, name: &str) -> Result<()> {
        info!("Dropping collection");

        if self.inner.collections.remove(name).is_none() {
            return Err(Error::CollectionNotFound(name.to_string()));
        }

        if let Some(ref path) = self.inner.config.data_path {
            let _disk = self.inner.disk.lock().await;
            persistence::remove_collection(path, name).await?;
            persistence::save_catalog(path, &self.list_collections()).await?;
        }

        Ok(())
    }

    /// Check if a collection exists.
    pub fn collection_exists(&self, name: &str) -> bool {
        self.inner.collections.contains(name)
    }

    /// List all collection names, sorted.
    pub fn list_collections(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.inner.collections.scan(|k, _| {
            names.push(k.clone());
        });
        names.sort();
        names
    }

    /// Get a reference to a collection.
    pub fn get_collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.inner
            .collections
            .read(name, |_, v| v.clone())
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    /// Stage a batch of documents; see [`Collection::insert`].
    ///
    /// Returns the assigned ids in batch order.
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub fn insert(&self, collection: &str, documents: &[NewDocument]) -> Result<Vec<DocumentId>> {
        let col = self.get_collection(collection)?;
        let ids = col.insert(documents)?;
        debug!("Staged batch");
        Ok(ids)
    }

    /// Make staged documents visible and, for persistent stores, durable.
    ///
    /// A persistent store writes the new segment to disk before publishing
    /// it. If the write fails, nothing becomes visible and the documents stay
    /// pending, so a later flush retries them without duplicating anything.
    ///
    /// Returns the number of documents made visible.
    #[instrument(skip(self))]
    pub async fn flush(&self, collection: &str) -> Result<usize> {
        let col = self.get_collection(collection)?;
        let Some(path) = self.data_path() else {
            let count = col.flush();
            debug!(count, "Flush completed");
            return Ok(count);
        };

        let _disk = self.inner.disk.lock().await;
        let count = match col.prepare_flush() {
            Some(staged) => self.write_through(path, &col, staged).await?,
            None => 0,
        };
        debug!(count, "Flush completed");
        Ok(count)
    }

    /// Build or replace the HNSW index of a collection.
    #[instrument(skip(self, params), fields(m = params.m, ef_construction = params.ef_construction))]
    pub async fn build_index(
        &self,
        collection: &str,
        metric: DistanceMetric,
        params: IndexParams,
    ) -> Result<IndexBuild> {
        let col = self.get_collection(collection)?;
        let outcome = match self.data_path() {
            None => col.build_index(metric, params)?,
            Some(path) => {
                let _disk = self.inner.disk.lock().await;
                match col.prepare_build_index(metric, params)? {
                    Some(staged) => IndexBuild::Built {
                        documents: self.write_through(path, &col, staged).await?,
                    },
                    None => IndexBuild::Unchanged,
                }
            }
        };
        if let IndexBuild::Built { documents } = outcome {
            info!(documents, "Index built");
        }
        Ok(outcome)
    }

    /// Drop the index of a collection. Returns whether one existed.
    #[instrument(skip(self))]
    pub async fn drop_index(&self, collection: &str) -> Result<bool> {
        let col = self.get_collection(collection)?;
        let Some(path) = self.data_path() else {
            return Ok(col.drop_index());
        };

        let _disk = self.inner.disk.lock().await;
        match col.prepare_drop_index() {
            Some(staged) => {
                self.write_through(path, &col, staged).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Search for the `k` most similar visible documents, best first.
    #[instrument(skip(self, query, params), fields(dim = query.len()))]
    pub fn search(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
        params: SearchParams,
    ) -> Result<Vec<ScoredResult>> {
        let col = self.get_collection(collection)?;
        let results = col.search(query, k, params)?;
        debug!(count = results.len(), "Search completed");
        Ok(results)
    }

    /// All visible documents of a collection in insertion order.
    pub fn scan(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        Ok(self.get_collection(collection)?.scan())
    }

    /// Delete documents by id from a collection.
    ///
    /// Persistent stores write the remaining documents before they become
    /// visible; on a failed write nothing is removed.
    ///
    /// Returns the number of documents actually removed.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete(&self, collection: &str, ids: &[DocumentId]) -> Result<usize> {
        let col = self.get_collection(collection)?;
        let removed = match self.data_path() {
            None => col.delete(ids),
            Some(path) => {
                let _disk = self.inner.disk.lock().await;
                match col.prepare_delete(ids) {
                    Some(staged) => self.write_through(path, &col, staged).await?,
                    None => 0,
                }
            }
        };
        debug!(removed, "Delete completed");
        Ok(removed)
    }

    /// Open a load scope on a collection.
    pub fn load(&self, collection: &str) -> Result<LoadGuard> {
        Ok(self.get_collection(collection)?.load())
    }

    /// Get the number of visible documents in a collection.
    pub fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.get_collection(collection)?.len())
    }

    /// Get collection statistics.
    pub fn collection_stats(&self, collection: &str) -> Result<CollectionStats> {
        Ok(self.get_collection(collection)?.stats())
    }

    /// Persist every collection to disk.
    ///
    /// No-op for in-memory databases.
    #[instrument(skip(self))]
    pub async fn persist(&self) -> Result<()> {
        let Some(ref path) = self.inner.config.data_path else {
            debug!("Skipping persist for in-memory database");
            return Ok(());
        };

        info!("Persisting database to disk");

        let mut to_persist: Vec<Arc<Collection>> = Vec::new();
        self.inner.collections.scan(|_, collection| {
            to_persist.push(collection.clone());
        });

        let _disk = self.inner.disk.lock().await;
        for collection in to_persist {
            persistence::save_collection(path, &collection).await?;
        }
        persistence::save_catalog(path, &self.list_collections()).await?;

        Ok(())
    }

    fn data_path(&self) -> Option<&Path> {
        self.inner.config.data_path.as_deref()
    }

    /// Write a staged segment to disk, then publish it.
    ///
    /// Callers hold the disk lock from prepare to here, so no other write
    /// can be published in between.
    async fn write_through(&self, path: &Path, col: &Collection, staged: StagedSegment) -> Result<usize> {
        persistence::save_segment(path, col, staged.segment()).await?;
        col.commit(staged)
    }

    async fn load_collections(&self, path: &Path) -> Result<()> {
        if !tokio::fs::try_exists(path).await? {
            tokio::fs::create_dir_all(path).await?;
            return Ok(());
        }

        let names = persistence::load_catalog(path).await?;
        for name in names {
            match persistence::load_collection(path, &name, self.inner.config.require_load).await {
                Ok(collection) => {
                    let _ = self.inner.collections.insert(name.clone(), Arc::new(collection));
                }
                Err(e) => {
                    warn!(name, error = %e, "Failed to load collection, skipping");
                }
            }
        }

        Ok(())
    }
}
