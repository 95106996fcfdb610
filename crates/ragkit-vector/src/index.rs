//! HNSW index wrapper.
//!
//! An [`HnswIndex`] is built once over a snapshot of a collection's visible
//! documents and never mutated afterwards. Flush and delete build a fresh one
//! with the same parameters, so an index always covers exactly the documents
//! of the segment it belongs to.
//!
//! The graph only *proposes* candidates. Callers re-score them with
//! [`DistanceMetric::similarity`] so indexed and exhaustive results agree on
//! scores.
//!
//! hnsw_rs requires non-negative distances, so vectors are mapped into a
//! graph space before insertion:
//!
//! - cosine: unit-normalized, searched with `DistCosine`;
//! - euclidean: unchanged, searched with `DistL2`;
//! - dot product: the inner-product to L2 reduction. Each stored vector `v`
//!   gets an extra coordinate `sqrt(M² - |v|²)` where `M` is the largest norm
//!   in the snapshot, the query gets `0`. Then
//!   `|q' - v'|² = |q|² + M² - 2 q·v`, so the nearest point under `DistL2` is
//!   the one with the largest inner product.

use crate::config::IndexParams;
use crate::distance::DistanceMetric;
use crate::types::StoredDocument;
use anndists::dist::distances::{DistCosine, DistL2, Distance};
use hnsw_rs::hnsw::Hnsw;
use tracing::debug;

const MAX_LAYER: usize = 16;

/// One graph type per metric.
enum IndexInner {
    Cosine(Hnsw<'static, f32, DistCosine>),
    Euclidean(Hnsw<'static, f32, DistL2>),
    DotProduct(Hnsw<'static, f32, DistL2>),
}

/// Immutable HNSW graph over a document snapshot.
///
/// Graph data ids are positions in the snapshot slice it was built from.
pub struct HnswIndex {
    inner: IndexInner,
    params: IndexParams,
    len: usize,
}

impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("params", &self.params)
            .field("len", &self.len)
            .finish()
    }
}

fn squared_norm(v: &[f32]) -> f64 {
    v.iter().map(|&x| f64::from(x) * f64::from(x)).sum()
}

/// `v / |v|`, computed in f64. Zero vectors stay zero.
fn unit(v: &[f32]) -> Vec<f32> {
    let n = squared_norm(v).sqrt();
    if n == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|&x| (f64::from(x) / n) as f32).collect()
}

/// Stored points for the dot-product graph, one extra coordinate each.
fn augmented(documents: &[StoredDocument]) -> Vec<Vec<f32>> {
    let squared: Vec<f64> = documents.iter().map(|d| squared_norm(&d.vector)).collect();
    let max = squared.iter().copied().fold(0.0f64, f64::max);

    documents
        .iter()
        .zip(squared)
        .map(|(doc, sq)| {
            let mut point = Vec::with_capacity(doc.vector.len() + 1);
            point.extend_from_slice(&doc.vector);
            point.push((max - sq).max(0.0).sqrt() as f32);
            point
        })
        .collect()
}

fn build_graph<D>(points: &[Vec<f32>], m: usize, ef_construction: usize, dist: D) -> Hnsw<'static, f32, D>
where
    D: Distance<f32> + Send + Sync,
{
    let data: Vec<(&Vec<f32>, usize)> = points.iter().zip(0..).collect();
    let hnsw = Hnsw::new(m, points.len().max(1), MAX_LAYER, ef_construction, dist);
    hnsw.parallel_insert(&data);
    hnsw
}

impl HnswIndex {
    /// Build a graph over `documents` with the given metric and parameters.
    pub fn build(metric: DistanceMetric, params: IndexParams, documents: &[StoredDocument]) -> Self {
        let m = params.m.max(1);
        let ef_construction = params.ef_construction.max(m);

        let inner = match metric {
            DistanceMetric::Cosine => {
                let points: Vec<Vec<f32>> = documents.iter().map(|d| unit(&d.vector)).collect();
                IndexInner::Cosine(build_graph(&points, m, ef_construction, DistCosine {}))
            }
            DistanceMetric::Euclidean => {
                let points: Vec<Vec<f32>> = documents.iter().map(|d| d.vector.clone()).collect();
                IndexInner::Euclidean(build_graph(&points, m, ef_construction, DistL2 {}))
            }
            DistanceMetric::DotProduct => {
                let points = augmented(documents);
                IndexInner::DotProduct(build_graph(&points, m, ef_construction, DistL2 {}))
            }
        };

        debug!(count = documents.len(), metric = %metric, m, ef_construction, "Built HNSW index");

        Self {
            inner,
            params,
            len: documents.len(),
        }
    }

    /// Parameters the graph was built with.
    pub fn params(&self) -> IndexParams {
        self.params
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the graph holds no documents.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Snapshot positions of up to `max(k, ef)` approximate nearest neighbours.
    pub fn candidates(&self, query: &[f32], k: usize, ef_search: Option<usize>) -> Vec<usize> {
        let ef = ef_search.unwrap_or(self.params.ef_search);
        let wanted = k.max(ef).min(self.len);
        let ef = ef.max(wanted);

        let neighbours = match &self.inner {
            IndexInner::Cosine(hnsw) => hnsw.search(&unit(query), wanted, ef),
            IndexInner::Euclidean(hnsw) => hnsw.search(query, wanted, ef),
            IndexInner::DotProduct(hnsw) => {
                let mut point = Vec::with_capacity(query.len() + 1);
                point.extend_from_slice(query);
                point.push(0.0);
                hnsw.search(&point, wanted, ef)
            }
        };

        neighbours
            .into_iter()
            .map(|n| n.d_id)
            .filter(|&position| position < self.len)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentId;
    use chrono::Utc;

    fn docs(vectors: &[&[f32]]) -> Vec<StoredDocument> {
        vectors
            .iter()
            .enumerate()
            .map(|(i, v)| StoredDocument {
                id: DocumentId(i as u64),
                text: format!("doc{i}"),
                vector: v.to_vec(),
                inserted_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_build_and_candidates() {
        let documents = docs(&[&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[0.9, 0.1, 0.0]]);
        let index = HnswIndex::build(DistanceMetric::Cosine, IndexParams::default(), &documents);

        assert_eq!(index.len(), 3);
        let found = index.candidates(&[1.0, 0.0, 0.0], 2, None);
        assert!(found.contains(&0));
        assert!(found.contains(&2));
    }

    #[test]
    fn test_candidates_never_exceed_len() {
        let documents = docs(&[&[1.0, 0.0], &[0.0, 1.0]]);
        let index = HnswIndex::build(DistanceMetric::Euclidean, IndexParams::fast(), &documents);

        let found = index.candidates(&[1.0, 0.0], 10, Some(50));
        assert!(found.len() <= 2);
        assert!(found.contains(&0));
    }

    #[test]
    fn test_dot_product_graph() {
        let documents = docs(&[&[1.0, 0.0], &[3.0, 0.0], &[0.0, 1.0]]);
        let index = HnswIndex::build(DistanceMetric::DotProduct, IndexParams::default(), &documents);

        let found = index.candidates(&[1.0, 0.0], 1, Some(8));
        assert_eq!(found.first(), Some(&1));
        assert_eq!(index.params(), IndexParams::default());
    }

    #[test]
    fn test_augmented_points_share_norm() {
        let documents = docs(&[&[1.0, 0.0], &[3.0, 0.0], &[0.0, 2.0]]);
        let points = augmented(&documents);

        assert_eq!(points[1], vec![3.0, 0.0, 0.0]);
        for point in &points {
            assert_eq!(point.len(), 3);
            assert!((squared_norm(point) - 9.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_cosine_graph_handles_extreme_scales() {
        let documents = docs(&[&[1e20, 1e20], &[1e-30, 0.0], &[0.0, 1e-30]]);
        let index = HnswIndex::build(DistanceMetric::Cosine, IndexParams::default(), &documents);

        let found = index.candidates(&[1.0, 0.0], 1, Some(8));
        assert_eq!(found.first(), Some(&1));
    }
}
