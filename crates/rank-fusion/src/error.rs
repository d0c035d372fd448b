//! Error types for score fusion.

use std::fmt;

/// Errors that can occur while fusing score vectors.
#[derive(Debug, Clone, PartialEq)]
pub enum FusionError {
    /// `weight_a + weight_b` (or the sum of a multi-way weight slice) was not 1.0.
    WeightsMustSumToOne,
    /// Score vectors being fused have mismatched lengths.
    LengthMismatch { expected: usize, actual: usize },
    /// `weighted_multi`/`weighted_multi_k` was called with mismatched vector and weight counts.
    VectorWeightCountMismatch { vectors: usize, weights: usize },
    /// No score vectors were supplied.
    EmptyInput,
}

impl fmt::Display for FusionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FusionError::WeightsMustSumToOne => {
                write!(f, "fusion weights must sum to 1.0")
            }
            FusionError::LengthMismatch { expected, actual } => {
                write!(f, "score vector length mismatch: expected {}, got {}", expected, actual)
            }
            FusionError::VectorWeightCountMismatch { vectors, weights } => {
                write!(
                    f,
                    "number of score vectors ({}) does not match number of weights ({})",
                    vectors, weights
                )
            }
            FusionError::EmptyInput => write!(f, "no score vectors were supplied"),
        }
    }
}

impl std::error::Error for FusionError {}
