//! First-stage retrieval for hybrid bug-localization search.
//!
//! This crate provides the two first-stage retrievers the pipeline fuses
//! scores from:
//!
//! - [`bm25`]: an inverted index with Okapi BM25 scoring over tokenized
//!   source files.
//! - [`dense`]: a brute-force flat index over document embeddings, scored by
//!   cosine similarity or negative L2 distance.
//!
//! Both retrievers expose a `score_all` that scores every document in the
//! corpus (not just a top-k), which is what the fusion ranker needs to
//! min-max normalize across the full candidate set before blending.
//!
//! # Quick Start
//!
//! ```rust
//! use rank_retrieve::prelude::*;
//!
//! let mut index = InvertedIndex::new();
//! index.add_document(0, &["the".to_string(), "quick".to_string()]);
//!
//! let query = vec!["quick".to_string()];
//! let results = index.retrieve(&query, 10, Bm25Params::default());
//! ```

/// BM25 retrieval module: inverted index and Okapi BM25 scoring.
///
/// Available when the `bm25` feature is enabled (on by default).
pub mod bm25;

/// Dense retrieval module: brute-force cosine/L2 similarity over flat embeddings.
///
/// Available when the `dense` feature is enabled (on by default).
pub mod dense;

/// Error types for retrieval operations.
pub mod error;

/// Unified retriever trait interface, implemented by both [`bm25::InvertedIndex`]
/// and [`dense::DenseIndex`].
pub mod retriever;

/// Single-artifact persistence: save/load a built index as one file.
pub mod persistence;

/// SIMD-accelerated vector primitives used by [`dense`].
pub mod simd;

pub use error::RetrieveError;

/// Retrieve top-k documents using BM25.
///
/// # Example
///
/// ```rust
/// use rank_retrieve::retrieve_bm25;
/// use rank_retrieve::bm25::{Bm25Params, InvertedIndex};
///
/// let mut index = InvertedIndex::new();
/// index.add_document(0, &["the".to_string(), "quick".to_string()]);
///
/// let query = vec!["quick".to_string()];
/// let results = retrieve_bm25(&index, &query, 10, Bm25Params::default()).unwrap();
/// assert!(!results.is_empty());
/// ```
#[cfg(feature = "bm25")]
pub fn retrieve_bm25(
    index: &crate::bm25::InvertedIndex,
    query: &[String],
    k: usize,
    params: crate::bm25::Bm25Params,
) -> Result<Vec<(u32, f32)>, RetrieveError> {
    index.retrieve(query, k, params)
}

/// Retrieve top-k documents using dense retrieval.
///
/// # Example
///
/// ```rust
/// use rank_retrieve::retrieve_dense;
/// use rank_retrieve::dense::DenseIndex;
///
/// let mut index = DenseIndex::new();
/// index.add_document(0, vec![1.0, 0.0, 0.0]);
///
/// let query = [1.0, 0.0, 0.0];
/// let results = retrieve_dense(&index, &query, 10).unwrap();
/// assert!(!results.is_empty());
/// ```
#[cfg(feature = "dense")]
pub fn retrieve_dense(
    index: &crate::dense::DenseIndex,
    query: &[f32],
    k: usize,
) -> Result<Vec<(u32, f32)>, RetrieveError> {
    index.retrieve(query, k)
}

/// Re-export of commonly used types.
pub mod prelude {
    pub use crate::RetrieveError;

    #[cfg(feature = "bm25")]
    pub use crate::retrieve_bm25;
    #[cfg(feature = "dense")]
    pub use crate::retrieve_dense;

    #[cfg(feature = "bm25")]
    pub use crate::bm25::{Bm25Params, Bm25Variant, InvertedIndex};
    #[cfg(feature = "dense")]
    pub use crate::dense::{DenseIndex, DenseMetric};

    pub use crate::retriever::{Retriever, RetrieverBuilder};
}

#[cfg(test)]
mod tests {
    #[cfg(feature = "bm25")]
    #[test]
    fn test_bm25_retrieval() {
        use crate::bm25::*;

        let mut index = InvertedIndex::new();
        index.add_document(0, &["test".to_string(), "document".to_string()]);

        let query = vec!["test".to_string()];
        let results = index.retrieve(&query, 10, Bm25Params::default()).unwrap();

        assert!(!results.is_empty());
        assert_eq!(results[0].0, 0);
    }

    #[cfg(feature = "bm25")]
    #[test]
    fn test_bm25_trait_interface() {
        use crate::bm25::*;
        use crate::retriever::Retriever;

        let mut index = InvertedIndex::new();
        index.add_document(0, &["test".to_string(), "document".to_string()]);

        let query = vec!["test".to_string()];
        let results = Retriever::retrieve(&index, &query, 10).unwrap();

        assert!(!results.is_empty());
        assert_eq!(results[0].0, 0);
    }
}
