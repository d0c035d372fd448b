//! Score fusion for hybrid (lexical + dense) retrieval.
//!
//! Takes independent "higher is better" score vectors over the same corpus
//! positions — one from BM25, one from a dense index — and combines them
//! into a single ranking. Unlike rank fusion methods that only see ranks
//! (RRF, CombMNZ, Borda), this operates on raw scores: each vector is
//! min-max normalized into `[0, 1]` (with an epsilon floor so a constant
//! vector degrades to all-zero instead of dividing by zero), then blended
//! with a convex combination of weights.
//!
//! # Example
//!
//! ```rust
//! use rank_fusion::{weighted_k, WeightedConfig};
//!
//! let bm25_scores = vec![2.0, 5.0, 1.0];
//! let dense_scores = vec![0.9, 0.1, 0.5];
//! let config = WeightedConfig::new(0.6, 0.4).unwrap();
//!
//! let results = weighted_k(&bm25_scores, &dense_scores, config, 2).unwrap();
//! assert_eq!(results.len(), 2);
//! ```

pub mod error;

pub use error::FusionError;

/// Floating-point tolerance for the `weight_a + weight_b == 1.0` check.
const WEIGHT_SUM_EPSILON: f32 = 1e-4;

/// Configuration for pairwise weighted fusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedConfig {
    pub weight_a: f32,
    pub weight_b: f32,
    /// Floor added to a normalization vector's range before dividing, so a
    /// constant score vector (`max == min`) normalizes to all-zero rather
    /// than producing NaN.
    pub epsilon: f32,
}

impl WeightedConfig {
    /// Default epsilon floor (`1e-8`), matching the min-max normalization
    /// constant used throughout the pipeline.
    pub const DEFAULT_EPSILON: f32 = 1e-8;

    /// Construct a config, requiring `weight_a + weight_b == 1.0` within
    /// [`WEIGHT_SUM_EPSILON`].
    pub fn new(weight_a: f32, weight_b: f32) -> Result<Self, FusionError> {
        Self::with_epsilon(weight_a, weight_b, Self::DEFAULT_EPSILON)
    }

    pub fn with_epsilon(weight_a: f32, weight_b: f32, epsilon: f32) -> Result<Self, FusionError> {
        if (weight_a + weight_b - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(FusionError::WeightsMustSumToOne);
        }
        Ok(Self {
            weight_a,
            weight_b,
            epsilon,
        })
    }
}

/// One entry in a fused ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedResult {
    /// 1-based rank within the returned list.
    pub rank: usize,
    /// Corpus position (shared alignment key between BM25 and dense indexes).
    pub doc_id: u32,
    /// Fused score, higher is better.
    pub score: f32,
}

/// Min-max normalize a score vector into `[0, 1]`, using `epsilon` as a floor
/// on the range so a constant vector normalizes to all-zero instead of
/// dividing by zero.
fn min_max_normalize(scores: &[f32], epsilon: f32) -> Vec<f32> {
    if scores.is_empty() {
        return Vec::new();
    }
    let min = scores.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let range = (max - min) + epsilon;
    scores.iter().map(|&s| (s - min) / range).collect()
}

fn validate_lengths(scores_a: &[f32], scores_b: &[f32]) -> Result<(), FusionError> {
    if scores_a.len() != scores_b.len() {
        return Err(FusionError::LengthMismatch {
            expected: scores_a.len(),
            actual: scores_b.len(),
        });
    }
    Ok(())
}

/// Min-max normalize `scores_a` and `scores_b` independently and blend them
/// with `config`'s weights. Returns a fused score vector the same length as
/// the inputs, in corpus-position order.
pub fn weighted(
    scores_a: &[f32],
    scores_b: &[f32],
    config: WeightedConfig,
) -> Result<Vec<f32>, FusionError> {
    validate_lengths(scores_a, scores_b)?;
    let norm_a = min_max_normalize(scores_a, config.epsilon);
    let norm_b = min_max_normalize(scores_b, config.epsilon);

    Ok(norm_a
        .iter()
        .zip(norm_b.iter())
        .map(|(&a, &b)| config.weight_a * a + config.weight_b * b)
        .collect())
}

/// Sort fused scores into a [`RankedResult`] list: descending by score, ties
/// broken by ascending corpus position, truncated to `min(N, top_k)`.
fn rank_and_truncate(scores: Vec<f32>, top_k: usize) -> Vec<RankedResult> {
    let mut indexed: Vec<(u32, f32)> = scores
        .into_iter()
        .enumerate()
        .map(|(i, s)| (i as u32, s))
        .collect();

    indexed.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    indexed
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(i, (doc_id, score))| RankedResult {
            rank: i + 1,
            doc_id,
            score,
        })
        .collect()
}

/// [`weighted`] plus ranking: fuse, sort descending, tie-break by ascending
/// corpus position, truncate to `min(N, top_k)`.
pub fn weighted_k(
    scores_a: &[f32],
    scores_b: &[f32],
    config: WeightedConfig,
    top_k: usize,
) -> Result<Vec<RankedResult>, FusionError> {
    let fused = weighted(scores_a, scores_b, config)?;
    Ok(rank_and_truncate(fused, top_k))
}

/// Generalization of [`weighted`] to more than two score vectors. Each vector
/// is independently min-max normalized (with `epsilon`) and summed with its
/// matching weight; weights must sum to 1.0.
pub fn weighted_multi(
    vectors: &[&[f32]],
    weights: &[f32],
    epsilon: f32,
) -> Result<Vec<f32>, FusionError> {
    if vectors.is_empty() {
        return Err(FusionError::EmptyInput);
    }
    if vectors.len() != weights.len() {
        return Err(FusionError::VectorWeightCountMismatch {
            vectors: vectors.len(),
            weights: weights.len(),
        });
    }
    let weight_sum: f32 = weights.iter().sum();
    if (weight_sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
        return Err(FusionError::WeightsMustSumToOne);
    }

    let n = vectors[0].len();
    for v in vectors.iter().skip(1) {
        if v.len() != n {
            return Err(FusionError::LengthMismatch {
                expected: n,
                actual: v.len(),
            });
        }
    }

    let normalized: Vec<Vec<f32>> = vectors.iter().map(|v| min_max_normalize(v, epsilon)).collect();

    let mut fused = vec![0.0f32; n];
    for (norm, &weight) in normalized.iter().zip(weights.iter()) {
        for (acc, &v) in fused.iter_mut().zip(norm.iter()) {
            *acc += weight * v;
        }
    }
    Ok(fused)
}

/// [`weighted_multi`] plus ranking, mirroring [`weighted_k`].
pub fn weighted_multi_k(
    vectors: &[&[f32]],
    weights: &[f32],
    epsilon: f32,
    top_k: usize,
) -> Result<Vec<RankedResult>, FusionError> {
    let fused = weighted_multi(vectors, weights, epsilon)?;
    Ok(rank_and_truncate(fused, top_k))
}
