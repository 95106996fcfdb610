//! Top-k retrieval.
//!
//! The [`Retriever`] embeds a question, fetches candidates from the vector
//! store and returns the best `k` passages under the collection metric.
//!
//! Deployment-level mismatches (missing collection, wrong dimensionality,
//! wrong metric) are caught once in [`Retriever::connect`], never per query.

use std::sync::Arc;

use ragkit_vector::{DistanceMetric, SearchParams, StoredDocument};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::embeddings::{normalize_text, Embedder};
use crate::db::VectorStore;
use crate::types::{AppError, Result, RetrievedPassage};

/// Where candidate scoring happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingPath {
    /// Scan every visible document and score it here.
    #[default]
    Exhaustive,
    /// Delegate to the store's `search` (HNSW when an index is built).
    Index,
}

impl std::str::FromStr for RankingPath {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "exhaustive" | "scan" => Ok(RankingPath::Exhaustive),
            "index" | "hnsw" => Ok(RankingPath::Index),
            _ => Err(AppError::Configuration(format!(
                "Unknown ranking path: {}",
                s
            ))),
        }
    }
}

/// Retriever settings, fixed per deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieverConfig {
    pub collection: String,
    pub metric: DistanceMetric,
    #[serde(default)]
    pub ranking: RankingPath,
    /// Candidate list size for index searches; the index default when unset.
    #[serde(default)]
    pub ef_search: Option<usize>,
}

impl RetrieverConfig {
    pub fn new(collection: impl Into<String>, metric: DistanceMetric) -> Self {
        Self {
            collection: collection.into(),
            metric,
            ranking: RankingPath::default(),
            ef_search: None,
        }
    }

    pub fn with_ranking(mut self, ranking: RankingPath) -> Self {
        self.ranking = ranking;
        self
    }

    pub fn with_ef_search(mut self, ef_search: usize) -> Self {
        self.ef_search = Some(ef_search);
        self
    }
}

/// Embeds queries and ranks stored passages against them.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    config: RetrieverConfig,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("embedder", &self.embedder.model_name())
            .field("store", &self.store.provider_name())
            .field("config", &self.config)
            .finish()
    }
}

impl Retriever {
    /// Validate the deployment and build a retriever.
    ///
    /// # Errors
    ///
    /// `Configuration` when the collection is missing, or when its
    /// dimensionality or metric disagrees with the embedder or `config`.
    pub async fn connect(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        config: RetrieverConfig,
    ) -> Result<Self> {
        let stats = store.describe(&config.collection).await.map_err(|e| match e {
            AppError::Configuration(msg) => AppError::Configuration(msg),
            other => AppError::Configuration(format!(
                "cannot describe collection '{}': {}",
                config.collection, other
            )),
        })?;

        if stats.dimensions != embedder.dimensions() {
            return Err(AppError::Configuration(format!(
                "embedder '{}' produces {} dimensions, collection '{}' stores {}",
                embedder.model_name(),
                embedder.dimensions(),
                config.collection,
                stats.dimensions
            )));
        }
        if stats.metric != config.metric {
            return Err(AppError::Configuration(format!(
                "retriever metric {} does not match collection '{}' metric {}",
                config.metric, config.collection, stats.metric
            )));
        }

        debug!(
            collection = %config.collection,
            metric = %config.metric,
            ranking = ?config.ranking,
            model = embedder.model_name(),
            "Retriever connected"
        );

        Ok(Self {
            embedder,
            store,
            config,
        })
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// The `k` passages most similar to `query_text`, best first.
    ///
    /// Returns fewer than `k` when the collection holds fewer documents.
    #[instrument(skip(self, query_text), fields(collection = %self.config.collection, ranking = ?self.config.ranking))]
    pub async fn retrieve(&self, query_text: &str, k: usize) -> Result<Vec<RetrievedPassage>> {
        if k == 0 {
            return Err(AppError::InvalidArgument("k must be > 0".to_string()));
        }
        let normalized = normalize_text(query_text);
        if normalized.is_empty() {
            return Err(AppError::InvalidArgument("query text is empty".to_string()));
        }

        let query = self.embedder.embed_one(&normalized).await?;
        let expected = self.embedder.dimensions();
        if query.len() != expected {
            return Err(AppError::Encoding(format!(
                "embedder '{}' returned {} dimensions, expected {}",
                self.embedder.model_name(),
                query.len(),
                expected
            )));
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(AppError::Encoding(
                "query embedding contains NaN or Inf".to_string(),
            ));
        }
        if self.config.metric.is_degenerate(&query) {
            return Err(AppError::DegenerateVector(
                "query embedding has zero magnitude".to_string(),
            ));
        }

        let passages = match self.config.ranking {
            RankingPath::Exhaustive => {
                let documents = self.store.scan(&self.config.collection).await?;
                if documents.is_empty() {
                    return Err(AppError::NoDocumentsAvailable(self.config.collection.clone()));
                }
                Self::rank(&query, &documents, self.config.metric, k)?
            }
            RankingPath::Index => self.search_index(&query, k).await?,
        };

        debug!(count = passages.len(), "Retrieved passages");
        Ok(passages)
    }

    async fn search_index(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedPassage>> {
        let params = SearchParams {
            ef_search: self.config.ef_search,
        };
        let collection = &self.config.collection;

        let results = match self.store.search(collection, query, k, params).await {
            Err(AppError::NotLoaded(_)) => {
                warn!(collection = %collection, "Collection not loaded, loading and retrying once");
                let guard = self.store.load(collection).await?;
                let retried = self.store.search(collection, query, k, params).await;
                self.store.release(guard);
                retried?
            }
            other => other?,
        };

        Ok(results.into_iter().map(RetrievedPassage::from).collect())
    }

    /// Score every candidate against `query`, sort best first and keep `k`.
    ///
    /// The sort is stable: equal scores keep insertion (id) order. A
    /// candidate whose length differs from the query's is a
    /// `DimensionMismatch` naming its position.
    pub fn rank(
        query: &[f32],
        candidates: &[StoredDocument],
        metric: DistanceMetric,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        if let Some((index, doc)) = candidates
            .iter()
            .enumerate()
            .find(|(_, doc)| doc.vector.len() != query.len())
        {
            return Err(AppError::DimensionMismatch {
                index,
                expected: query.len(),
                actual: doc.vector.len(),
            });
        }

        Ok(ragkit_vector::rank_documents(metric, query, candidates, k)
            .into_iter()
            .map(RetrievedPassage::from)
            .collect())
    }
}
