//! Document collection.
//!
//! A collection is a named container for documents with a fixed
//! dimensionality and distance metric. Its state has two halves:
//!
//! - the *visible segment*: an immutable snapshot of flushed documents plus an
//!   optional HNSW index over exactly those documents, swapped atomically;
//! - the *pending buffer*: documents accepted by `insert` but not yet flushed.
//!
//! Readers clone the segment `Arc` and work lock-free, so a search never sees
//! a half-applied write and is unaffected by a concurrent flush or release.

use crate::config::{IndexParams, SearchParams};
use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::index::HnswIndex;
use crate::types::{
    CollectionSchema, CollectionStats, DocumentId, IndexBuild, NewDocument, ScoredResult,
    StoredDocument,
};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Immutable view of the visible documents.
#[derive(Debug, Default)]
pub struct Segment {
    documents: Vec<StoredDocument>,
    index: Option<HnswIndex>,
}

impl Segment {
    /// Visible documents in insertion order.
    pub fn documents(&self) -> &[StoredDocument] {
        &self.documents
    }

    /// Index over the documents, if one has been built.
    pub fn index(&self) -> Option<&HnswIndex> {
        self.index.as_ref()
    }
}

/// A write computed against one segment but not yet visible.
///
/// Produced by the `prepare_*` methods and published by
/// [`Collection::commit`]. Persistent stores write it to disk in between, so
/// a failed write leaves the visible state and the pending buffer untouched.
pub struct StagedSegment {
    base: Arc<Segment>,
    segment: Option<Segment>,
    consumed: HashSet<DocumentId>,
    affected: usize,
}

impl StagedSegment {
    /// The segment that becomes visible on commit.
    pub fn segment(&self) -> &Segment {
        self.segment.as_ref().unwrap_or(self.base.as_ref())
    }

    /// Documents made visible, indexed or removed by this write.
    pub fn affected(&self) -> usize {
        self.affected
    }
}

impl std::fmt::Debug for StagedSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedSegment")
            .field("documents", &self.segment().documents.len())
            .field("indexed", &self.segment().index.is_some())
            .field("affected", &self.affected)
            .finish()
    }
}

/// A named collection of documents.
pub struct Collection {
    schema: CollectionSchema,
    segment: RwLock<Arc<Segment>>,
    pending: Mutex<Vec<StoredDocument>>,
    /// Serializes flush, index and delete.
    write_lock: Mutex<()>,
    next_id: AtomicU64,
    loads: AtomicUsize,
    require_load: bool,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("schema", &self.schema)
            .field("loads", &self.loads.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Check a collection name: non-empty ASCII letters, digits, `_` or `-`.
///
/// Names double as directory names in persistent stores.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidArgument("collection name is empty".to_string()));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::InvalidArgument(format!(
            "collection name '{}' may only contain letters, digits, '_' and '-'",
            name
        )));
    }
    Ok(())
}

impl Collection {
    /// Create an empty collection.
    pub fn new(schema: CollectionSchema, require_load: bool) -> Result<Self> {
        validate_name(&schema.name)?;
        if schema.dimensions == 0 {
            return Err(Error::InvalidArgument("dimensions must be > 0".to_string()));
        }
        if schema.max_text_bytes == 0 {
            return Err(Error::InvalidArgument(
                "max_text_bytes must be > 0".to_string(),
            ));
        }

        Ok(Self {
            schema,
            segment: RwLock::new(Arc::new(Segment::default())),
            pending: Mutex::new(Vec::new()),
            write_lock: Mutex::new(()),
            next_id: AtomicU64::new(0),
            loads: AtomicUsize::new(0),
            require_load,
        })
    }

    /// Rebuild a collection from persisted parts.
    ///
    /// `documents` must be in ascending id order; an index is rebuilt when
    /// `index` is set.
    pub(crate) fn restore(
        schema: CollectionSchema,
        documents: Vec<StoredDocument>,
        next_id: u64,
        index: Option<IndexParams>,
        require_load: bool,
    ) -> Result<Self> {
        let collection = Self::new(schema, require_load)?;

        for (position, doc) in documents.iter().enumerate() {
            collection.validate(position, &doc.text, &doc.vector)?;
        }
        if documents.windows(2).any(|w| w[0].id >= w[1].id) {
            return Err(Error::Persistence(format!(
                "documents of '{}' are not in ascending id order",
                collection.schema.name
            )));
        }
        let floor = documents.last().map(|d| d.id.0 + 1).unwrap_or(0);

        let index =
            index.map(|params| HnswIndex::build(collection.schema.metric, params, &documents));
        *collection.segment.write() = Arc::new(Segment { documents, index });
        collection.next_id.store(next_id.max(floor), Ordering::SeqCst);

        Ok(collection)
    }

    /// Get the collection name.
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Get the fixed schema.
    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    /// Get the vector dimensions.
    pub fn dimensions(&self) -> usize {
        self.schema.dimensions
    }

    /// Get the distance metric.
    pub fn metric(&self) -> DistanceMetric {
        self.schema.metric
    }

    /// Number of visible documents.
    pub fn len(&self) -> usize {
        self.snapshot().documents.len()
    }

    /// True when no document is visible.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of staged documents awaiting flush.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Next id that will be assigned.
    pub fn next_id(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }

    /// Current visible segment.
    pub fn snapshot(&self) -> Arc<Segment> {
        self.segment.read().clone()
    }

    /// Parameters of the current index, if any.
    pub fn index_params(&self) -> Option<IndexParams> {
        self.snapshot().index.as_ref().map(HnswIndex::params)
    }

    /// Number of live load scopes.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// True while at least one load scope is alive.
    pub fn is_loaded(&self) -> bool {
        self.loads() > 0
    }

    fn validate(&self, index: usize, text: &str, vector: &[f32]) -> Result<()> {
        if vector.len() != self.schema.dimensions {
            return Err(Error::DimensionMismatch {
                index,
                expected: self.schema.dimensions,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidVector {
                index,
                reason: "vector contains NaN or Inf".to_string(),
            });
        }
        if self.schema.metric.is_degenerate(vector) {
            return Err(Error::InvalidVector {
                index,
                reason: format!("zero vector cannot be scored under {}", self.schema.metric),
            });
        }
        if text.len() > self.schema.max_text_bytes {
            return Err(Error::TextTooLong {
                index,
                max: self.schema.max_text_bytes,
                actual: text.len(),
            });
        }
        Ok(())
    }

    /// Stage a batch of documents.
    ///
    /// The whole batch is validated before anything is staged; on error no
    /// document of the batch is kept. Accepted documents get consecutive ids
    /// and stay invisible until [`Collection::flush`].
    pub fn insert(&self, documents: &[NewDocument]) -> Result<Vec<DocumentId>> {
        for (index, doc) in documents.iter().enumerate() {
            self.validate(index, &doc.text, &doc.vector)?;
        }
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let mut pending = self.pending.lock();
        let first = self
            .next_id
            .fetch_add(documents.len() as u64, Ordering::SeqCst);

        let ids: Vec<DocumentId> = (0..documents.len() as u64)
            .map(|offset| DocumentId(first + offset))
            .collect();

        pending.extend(documents.iter().zip(&ids).map(|(doc, &id)| StoredDocument {
            id,
            text: doc.text.clone(),
            vector: doc.vector.clone(),
            inserted_at: now,
        }));

        trace!(collection = %self.schema.name, count = ids.len(), first, "Staged documents");
        Ok(ids)
    }

    /// Make every staged document visible.
    ///
    /// Rebuilds an existing index over the new member set before the swap.
    /// Returns the number of documents made visible.
    pub fn flush(&self) -> usize {
        let _write = self.write_lock.lock();
        match self.prepare_flush_locked() {
            Some(staged) => self.commit_locked(staged),
            None => 0,
        }
    }

    /// Compute the segment a flush would produce, without publishing it.
    ///
    /// Returns `None` when nothing is pending. The staged documents stay in
    /// the pending buffer until [`Collection::commit`].
    pub fn prepare_flush(&self) -> Option<StagedSegment> {
        let _write = self.write_lock.lock();
        self.prepare_flush_locked()
    }

    fn prepare_flush_locked(&self) -> Option<StagedSegment> {
        let staged: Vec<StoredDocument> = self.pending.lock().clone();
        if staged.is_empty() {
            return None;
        }

        let base = self.snapshot();
        let consumed: HashSet<DocumentId> = staged.iter().map(|doc| doc.id).collect();
        let count = staged.len();

        let mut documents = Vec::with_capacity(base.documents.len() + count);
        documents.extend(base.documents.iter().cloned());
        documents.extend(staged);

        let index = base
            .index
            .as_ref()
            .map(|idx| HnswIndex::build(self.schema.metric, idx.params(), &documents));

        Some(StagedSegment {
            base,
            segment: Some(Segment { documents, index }),
            consumed,
            affected: count,
        })
    }

    /// Build (or replace) the HNSW index over the visible documents.
    pub fn build_index(&self, metric: DistanceMetric, params: IndexParams) -> Result<IndexBuild> {
        let _write = self.write_lock.lock();
        Ok(match self.prepare_build_index_locked(metric, params)? {
            Some(staged) => IndexBuild::Built {
                documents: self.commit_locked(staged),
            },
            None => IndexBuild::Unchanged,
        })
    }

    /// Compute the indexed segment without publishing it.
    ///
    /// Returns `None` when an index with identical parameters already covers
    /// the visible documents.
    pub fn prepare_build_index(
        &self,
        metric: DistanceMetric,
        params: IndexParams,
    ) -> Result<Option<StagedSegment>> {
        let _write = self.write_lock.lock();
        self.prepare_build_index_locked(metric, params)
    }

    fn prepare_build_index_locked(
        &self,
        metric: DistanceMetric,
        params: IndexParams,
    ) -> Result<Option<StagedSegment>> {
        if metric != self.schema.metric {
            return Err(Error::MetricMismatch {
                collection: self.schema.name.clone(),
                expected: self.schema.metric,
                actual: metric,
            });
        }
        if params.m == 0 {
            return Err(Error::InvalidArgument("index m must be > 0".to_string()));
        }

        let base = self.snapshot();
        if base.documents.is_empty() {
            return Err(Error::CollectionEmpty(self.schema.name.clone()));
        }
        if let Some(existing) = &base.index {
            if existing.params() == params && existing.len() == base.documents.len() {
                return Ok(None);
            }
        }

        let index = HnswIndex::build(metric, params, &base.documents);
        let documents = base.documents.clone();
        let affected = documents.len();

        Ok(Some(StagedSegment {
            base,
            segment: Some(Segment {
                documents,
                index: Some(index),
            }),
            consumed: HashSet::new(),
            affected,
        }))
    }

    /// Remove the index; searches fall back to exhaustive scoring.
    ///
    /// Returns whether an index existed.
    pub fn drop_index(&self) -> bool {
        let _write = self.write_lock.lock();
        match self.prepare_drop_index_locked() {
            Some(staged) => {
                self.commit_locked(staged);
                true
            }
            None => false,
        }
    }

    /// Compute the segment without its index. `None` when there is no index.
    pub fn prepare_drop_index(&self) -> Option<StagedSegment> {
        let _write = self.write_lock.lock();
        self.prepare_drop_index_locked()
    }

    fn prepare_drop_index_locked(&self) -> Option<StagedSegment> {
        let base = self.snapshot();
        base.index.as_ref()?;

        let documents = base.documents.clone();
        let affected = documents.len();
        Some(StagedSegment {
            base,
            segment: Some(Segment {
                documents,
                index: None,
            }),
            consumed: HashSet::new(),
            affected,
        })
    }

    /// Remove visible and pending documents with the given ids.
    ///
    /// Returns the number of documents removed.
    pub fn delete(&self, ids: &[DocumentId]) -> usize {
        let _write = self.write_lock.lock();
        match self.prepare_delete_locked(ids) {
            Some(staged) => self.commit_locked(staged),
            None => 0,
        }
    }

    /// Compute the segment with `ids` removed. `None` when no id matches.
    pub fn prepare_delete(&self, ids: &[DocumentId]) -> Option<StagedSegment> {
        let _write = self.write_lock.lock();
        self.prepare_delete_locked(ids)
    }

    fn prepare_delete_locked(&self, ids: &[DocumentId]) -> Option<StagedSegment> {
        let wanted: HashSet<DocumentId> = ids.iter().copied().collect();
        if wanted.is_empty() {
            return None;
        }

        let consumed: HashSet<DocumentId> = self
            .pending
            .lock()
            .iter()
            .map(|doc| doc.id)
            .filter(|id| wanted.contains(id))
            .collect();

        let base = self.snapshot();
        let documents: Vec<StoredDocument> = base
            .documents
            .iter()
            .filter(|doc| !wanted.contains(&doc.id))
            .cloned()
            .collect();
        let removed_visible = base.documents.len() - documents.len();
        if removed_visible == 0 && consumed.is_empty() {
            return None;
        }

        // Only pending documents matched: the visible segment stays as it is.
        let segment = (removed_visible > 0).then(|| {
            let index = base
                .index
                .as_ref()
                .map(|idx| HnswIndex::build(self.schema.metric, idx.params(), &documents));
            Segment { documents, index }
        });

        Some(StagedSegment {
            affected: removed_visible + consumed.len(),
            base,
            segment,
            consumed,
        })
    }

    /// Publish a staged segment and drop the pending documents it consumed.
    ///
    /// Fails with [`Error::Conflict`] when another write was published after
    /// the segment was prepared; nothing changes in that case. Returns the
    /// number of documents the write affected.
    pub fn commit(&self, staged: StagedSegment) -> Result<usize> {
        let _write = self.write_lock.lock();
        if !Arc::ptr_eq(&self.snapshot(), &staged.base) {
            return Err(Error::Conflict(self.schema.name.clone()));
        }
        Ok(self.commit_locked(staged))
    }

    fn commit_locked(&self, staged: StagedSegment) -> usize {
        let StagedSegment {
            segment,
            consumed,
            affected,
            ..
        } = staged;

        if let Some(segment) = segment {
            *self.segment.write() = Arc::new(segment);
        }
        if !consumed.is_empty() {
            self.pending.lock().retain(|doc| !consumed.contains(&doc.id));
        }

        debug!(collection = %self.schema.name, affected, "Published segment");
        affected
    }

    /// Top-`k` visible documents for `query`, best first.
    ///
    /// Ties are broken by ascending id (insertion order).
    pub fn search(&self, query: &[f32], k: usize, params: SearchParams) -> Result<Vec<ScoredResult>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be > 0".to_string()));
        }
        if query.len() != self.schema.dimensions {
            return Err(Error::QueryDimensionMismatch {
                expected: self.schema.dimensions,
                actual: query.len(),
            });
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidArgument(
                "query vector contains NaN or Inf".to_string(),
            ));
        }
        if self.schema.metric.is_degenerate(query) {
            return Err(Error::DegenerateVector(format!(
                "zero query vector cannot be scored under {}",
                self.schema.metric
            )));
        }
        if self.require_load && !self.is_loaded() {
            return Err(Error::NotLoaded(self.schema.name.clone()));
        }

        let segment = self.snapshot();
        if segment.documents.is_empty() {
            return Err(Error::CollectionEmpty(self.schema.name.clone()));
        }

        let results = match &segment.index {
            Some(index) => {
                let positions = index.candidates(query, k, params.ef_search);
                rank_positions(self.schema.metric, query, &segment.documents, positions, k)
            }
            None => rank_documents(self.schema.metric, query, &segment.documents, k),
        };

        Ok(results)
    }

    /// All visible documents in insertion order.
    pub fn scan(&self) -> Vec<StoredDocument> {
        self.snapshot().documents.clone()
    }

    /// Open a load scope. The collection stays loaded while the guard lives.
    pub fn load(self: &Arc<Self>) -> LoadGuard {
        let loads = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(collection = %self.schema.name, loads, "Load scope opened");
        LoadGuard {
            collection: Arc::clone(self),
        }
    }

    /// Get collection statistics.
    pub fn stats(&self) -> CollectionStats {
        let segment = self.snapshot();
        CollectionStats {
            name: self.schema.name.clone(),
            dimensions: self.schema.dimensions,
            metric: self.schema.metric,
            document_count: segment.documents.len(),
            pending_count: self.pending_len(),
            index: segment.index.as_ref().map(HnswIndex::params),
            loads: self.loads(),
            max_text_bytes: self.schema.max_text_bytes,
        }
    }
}

/// RAII load scope on a collection.
///
/// Dropping the guard (or calling [`LoadGuard::release`]) ends the scope.
#[must_use = "the collection is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct LoadGuard {
    collection: Arc<Collection>,
}

impl LoadGuard {
    /// Name of the loaded collection.
    pub fn collection(&self) -> &str {
        self.collection.name()
    }

    /// End the scope explicitly.
    pub fn release(self) {}
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        let loads = self.collection.loads.fetch_sub(1, Ordering::SeqCst) - 1;
        trace!(collection = %self.collection.name(), loads, "Load scope released");
    }
}

/// Score every document against `query` and keep the best `k`.
///
/// Sorting is stable on (score descending, id ascending).
pub fn rank_documents(
    metric: DistanceMetric,
    query: &[f32],
    documents: &[StoredDocument],
    k: usize,
) -> Vec<ScoredResult> {
    rank_positions(metric, query, documents, 0..documents.len(), k)
}

fn rank_positions(
    metric: DistanceMetric,
    query: &[f32],
    documents: &[StoredDocument],
    positions: impl IntoIterator<Item = usize>,
    k: usize,
) -> Vec<ScoredResult> {
    let mut scored: Vec<(usize, f32)> = positions
        .into_iter()
        .filter_map(|pos| {
            let doc = documents.get(pos)?;
            Some((pos, metric.similarity(query, &doc.vector)))
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(CmpOrdering::Equal)
            .then_with(|| documents[a.0].id.cmp(&documents[b.0].id))
    });
    scored.truncate(k);

    scored
        .into_iter()
        .map(|(pos, score)| ScoredResult {
            id: documents[pos].id,
            text: documents[pos].text.clone(),
            score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(dimensions: usize, metric: DistanceMetric) -> Arc<Collection> {
        Arc::new(Collection::new(CollectionSchema::new("test", dimensions, metric), false).unwrap())
    }

    fn doc(text: &str, vector: &[f32]) -> NewDocument {
        NewDocument::new(text, vector.to_vec())
    }

    #[test]
    fn test_collection_basic() {
        let col = collection(3, DistanceMetric::Cosine);

        assert_eq!(col.name(), "test");
        assert_eq!(col.dimensions(), 3);
        assert_eq!(col.metric(), DistanceMetric::Cosine);
        assert!(col.is_empty());
    }

    #[test]
    fn test_invalid_schema() {
        let zero = Collection::new(CollectionSchema::new("x", 0, DistanceMetric::Cosine), false);
        assert!(matches!(zero, Err(Error::InvalidArgument(_))));

        let empty = Collection::new(CollectionSchema::new("", 3, DistanceMetric::Cosine), false);
        assert!(matches!(empty, Err(Error::InvalidArgument(_))));

        let path = Collection::new(CollectionSchema::new("../x", 3, DistanceMetric::Cosine), false);
        assert!(matches!(path, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_insert_is_invisible_until_flush() {
        let col = collection(2, DistanceMetric::Cosine);

        let ids = col.insert(&[doc("a", &[1.0, 0.0]), doc("b", &[0.0, 1.0])]).unwrap();
        assert_eq!(ids, vec![DocumentId(0), DocumentId(1)]);
        assert_eq!(col.pending_len(), 2);
        assert!(col.scan().is_empty());
        assert!(matches!(
            col.search(&[1.0, 0.0], 1, SearchParams::default()),
            Err(Error::CollectionEmpty(_))
        ));

        assert_eq!(col.flush(), 2);
        assert_eq!(col.flush(), 0);
        assert_eq!(col.len(), 2);
        assert_eq!(col.pending_len(), 0);
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let col = collection(2, DistanceMetric::Cosine);

        let err = col
            .insert(&[doc("ok", &[1.0, 0.0]), doc("bad", &[1.0, 0.0, 0.0])])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                index: 1,
                expected: 2,
                actual: 3
            }
        ));
        assert_eq!(col.pending_len(), 0);
        assert_eq!(col.next_id(), 0);
    }

    #[test]
    fn test_invalid_vectors_rejected() {
        let col = collection(2, DistanceMetric::Cosine);

        let nan = col.insert(&[doc("nan", &[f32::NAN, 0.0])]);
        assert!(matches!(nan, Err(Error::InvalidVector { index: 0, .. })));

        let zero = col.insert(&[doc("zero", &[0.0, 0.0])]);
        assert!(matches!(zero, Err(Error::InvalidVector { index: 0, .. })));

        let l2 = collection(2, DistanceMetric::Euclidean);
        assert!(l2.insert(&[doc("origin", &[0.0, 0.0])]).is_ok());
    }

    #[test]
    fn test_text_bound() {
        let col = Collection::new(
            CollectionSchema::new("short", 2, DistanceMetric::Cosine).with_max_text_bytes(4),
            false,
        )
        .unwrap();

        let err = col.insert(&[doc("fits", &[1.0, 0.0]), doc("too long", &[1.0, 0.0])]);
        assert!(matches!(
            err,
            Err(Error::TextTooLong {
                index: 1,
                max: 4,
                actual: 8
            })
        ));
    }

    #[test]
    fn test_search_ranking_and_ties() {
        let col = collection(2, DistanceMetric::Cosine);
        col.insert(&[
            doc("A", &[1.0, 0.0]),
            doc("B", &[0.0, 1.0]),
            doc("C", &[0.9, 0.1]),
            doc("A2", &[2.0, 0.0]),
        ])
        .unwrap();
        col.flush();

        let results = col.search(&[1.0, 0.0], 3, SearchParams::default()).unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "A2", "C"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_search_argument_errors() {
        let col = collection(2, DistanceMetric::Cosine);
        col.insert(&[doc("A", &[1.0, 0.0])]).unwrap();
        col.flush();

        assert!(matches!(
            col.search(&[1.0, 0.0], 0, SearchParams::default()),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            col.search(&[1.0], 1, SearchParams::default()),
            Err(Error::QueryDimensionMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            col.search(&[0.0, 0.0], 1, SearchParams::default()),
            Err(Error::DegenerateVector(_))
        ));
    }

    #[test]
    fn test_index_lifecycle() {
        let col = collection(2, DistanceMetric::Cosine);

        assert!(matches!(
            col.build_index(DistanceMetric::Cosine, IndexParams::default()),
            Err(Error::CollectionEmpty(_))
        ));

        col.insert(&[doc("A", &[1.0, 0.0]), doc("B", &[0.0, 1.0]), doc("C", &[0.9, 0.1])])
            .unwrap();
        col.flush();

        assert!(matches!(
            col.build_index(DistanceMetric::Euclidean, IndexParams::default()),
            Err(Error::MetricMismatch { .. })
        ));

        let first = col.build_index(DistanceMetric::Cosine, IndexParams::default()).unwrap();
        assert_eq!(first, IndexBuild::Built { documents: 3 });
        let before = col.search(&[1.0, 0.0], 2, SearchParams::default()).unwrap();

        let second = col.build_index(DistanceMetric::Cosine, IndexParams::default()).unwrap();
        assert_eq!(second, IndexBuild::Unchanged);
        let after = col.search(&[1.0, 0.0], 2, SearchParams::default()).unwrap();
        assert_eq!(before, after);

        let ids: Vec<u64> = after.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![0, 2]);

        assert!(col.drop_index());
        assert!(!col.drop_index());
        assert!(col.index_params().is_none());
    }

    #[test]
    fn test_flush_rebuilds_index() {
        let col = collection(2, DistanceMetric::Cosine);
        col.insert(&[doc("A", &[1.0, 0.0])]).unwrap();
        col.flush();
        col.build_index(DistanceMetric::Cosine, IndexParams::fast()).unwrap();

        col.insert(&[doc("B", &[0.0, 1.0])]).unwrap();
        col.flush();

        assert_eq!(col.index_params(), Some(IndexParams::fast()));
        let results = col.search(&[0.0, 1.0], 1, SearchParams::default()).unwrap();
        assert_eq!(results[0].text, "B");
        assert_eq!(
            col.build_index(DistanceMetric::Cosine, IndexParams::fast()).unwrap(),
            IndexBuild::Unchanged
        );
    }

    #[test]
    fn test_delete_visible_and_pending() {
        let col = collection(2, DistanceMetric::Cosine);
        let ids = col.insert(&[doc("A", &[1.0, 0.0]), doc("B", &[0.0, 1.0])]).unwrap();
        col.flush();
        let pending = col.insert(&[doc("C", &[0.5, 0.5])]).unwrap();

        assert_eq!(col.delete(&[ids[0], pending[0], DocumentId(99)]), 2);
        assert_eq!(col.len(), 1);
        assert_eq!(col.pending_len(), 0);

        // ids are never reused
        let next = col.insert(&[doc("D", &[1.0, 1.0])]).unwrap();
        assert_eq!(next, vec![DocumentId(3)]);
    }

    #[test]
    fn test_prepared_flush_is_invisible_until_commit() {
        let col = collection(2, DistanceMetric::Cosine);
        col.insert(&[doc("A", &[1.0, 0.0])]).unwrap();

        let staged = col.prepare_flush().unwrap();
        assert_eq!(staged.affected(), 1);
        assert_eq!(staged.segment().documents().len(), 1);
        assert!(col.is_empty());
        assert_eq!(col.pending_len(), 1);

        // inserted after prepare: stays pending across the commit
        col.insert(&[doc("B", &[0.0, 1.0])]).unwrap();
        assert_eq!(col.commit(staged).unwrap(), 1);
        assert_eq!(col.len(), 1);
        assert_eq!(col.pending_len(), 1);
        assert_eq!(col.scan()[0].text, "A");
    }

    #[test]
    fn test_commit_rejects_stale_segment() {
        let col = collection(2, DistanceMetric::Cosine);
        col.insert(&[doc("A", &[1.0, 0.0])]).unwrap();
        let staged = col.prepare_flush().unwrap();

        col.insert(&[doc("B", &[0.0, 1.0])]).unwrap();
        assert_eq!(col.flush(), 2);

        assert!(matches!(col.commit(staged), Err(Error::Conflict(_))));
        assert_eq!(col.len(), 2);
        assert_eq!(col.pending_len(), 0);
    }

    #[test]
    fn test_tiny_and_huge_vectors_accepted() {
        let col = collection(2, DistanceMetric::Cosine);
        col.insert(&[doc("tiny", &[1e-30, 0.0]), doc("huge", &[1e20, 1e20])])
            .unwrap();
        assert_eq!(col.flush(), 2);
    }

    #[test]
    fn test_load_scopes() {
        let col = Arc::new(
            Collection::new(CollectionSchema::new("gated", 2, DistanceMetric::Cosine), true).unwrap(),
        );
        col.insert(&[doc("A", &[1.0, 0.0])]).unwrap();
        col.flush();

        assert!(matches!(
            col.search(&[1.0, 0.0], 1, SearchParams::default()),
            Err(Error::NotLoaded(_))
        ));

        let guard = col.load();
        let nested = col.load();
        assert_eq!(col.loads(), 2);
        assert!(col.search(&[1.0, 0.0], 1, SearchParams::default()).is_ok());

        nested.release();
        assert!(col.is_loaded());
        drop(guard);
        assert!(!col.is_loaded());
    }

    #[test]
    fn test_stats() {
        let col = collection(4, DistanceMetric::Euclidean);
        col.insert(&[doc("A", &[0.0; 4])]).unwrap();
        col.flush();
        col.insert(&[doc("B", &[1.0; 4])]).unwrap();

        let stats = col.stats();
        assert_eq!(stats.name, "test");
        assert_eq!(stats.document_count, 1);
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.dimensions, 4);
        assert_eq!(stats.metric, DistanceMetric::Euclidean);
        assert!(stats.index.is_none());
    }
}
