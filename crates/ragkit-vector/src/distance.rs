//! Similarity metrics.
//!
//! Every metric is exposed as a *similarity*: higher always means closer, so
//! ranking code never needs to know which metric a collection uses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metric a collection (and its index) ranks by.
///
/// Fixed when the collection is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine of the angle between vectors, in [-1, 1]. Scale-invariant.
    #[default]
    Cosine,

    /// Euclidean (L2) distance mapped to `1 / (1 + d)`, in (0, 1].
    #[serde(alias = "l2")]
    Euclidean,

    /// Inner product. Unbounded; meaningful for normalized embeddings.
    #[serde(alias = "ip", alias = "dot")]
    DotProduct,
}

impl DistanceMetric {
    /// Similarity between two vectors of equal length (higher = more similar).
    ///
    /// Cosine with a zero vector yields 0.0; callers that must reject
    /// degenerate input check [`DistanceMetric::is_degenerate`] first.
    /// Lengths are checked by callers; extra trailing entries of the longer
    /// slice are ignored.
    #[inline]
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => cosine_similarity(a, b),
            DistanceMetric::Euclidean => 1.0 / (1.0 + euclidean_distance(a, b)),
            DistanceMetric::DotProduct => dot_product(a, b),
        }
    }

    /// True when `v` cannot be scored under this metric.
    ///
    /// Only cosine needs a direction; the zero vector has none. Any non-zero
    /// component gives a direction, however small.
    pub fn is_degenerate(&self, v: &[f32]) -> bool {
        matches!(self, DistanceMetric::Cosine) && v.iter().all(|&x| x == 0.0)
    }

    /// Get the name of this metric.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::DotProduct => "dot_product",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" | "cos" => Ok(DistanceMetric::Cosine),
            "euclidean" | "l2" | "euclid" => Ok(DistanceMetric::Euclidean),
            "dot" | "dot_product" | "dotproduct" | "ip" | "inner" => Ok(DistanceMetric::DotProduct),
            _ => Err(format!("Unknown distance metric: {}", s)),
        }
    }
}

/// L2 norm of a vector, accumulated in f64.
#[inline]
pub fn norm(v: &[f32]) -> f32 {
    sum_of_squares(v).sqrt() as f32
}

// ============================================================================
// Kernels
// ============================================================================
//
// Products are accumulated in f64: squaring an f32 underflows to zero below
// ~1e-19 and overflows to infinity above ~1e19.

#[inline]
fn sum_of_squares(v: &[f32]) -> f64 {
    v.iter().map(|&x| f64::from(x) * f64::from(x)).sum()
}

#[inline]
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0) as f32
    }
}

#[inline]
fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum::<f64>()
        .sqrt() as f32
}

#[inline]
fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum::<f64>() as f32
}
