//! Dense vector retrieval.
//!
//! `DenseIndex` is a brute-force flat index over document embeddings: O(n*d)
//! per query where n is corpus size and d is embedding dimension. That is the
//! right trade-off for a corpus frozen at index-build time and re-scored from
//! scratch on every run — there is no incremental insert to amortize an ANN
//! structure's build cost against.
//!
//! Two metrics are supported: cosine similarity (vectors assumed normalized;
//! falls back to the SIMD dot product) and negated L2 distance, transformed
//! via `s = -d` so that "higher is better" holds for both metrics uniformly.

#[cfg(feature = "dense")]
use crate::retriever::{Retriever, RetrieverBuilder};
use crate::RetrieveError;

/// Distance metric used to score a query embedding against document embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum DenseMetric {
    /// Cosine similarity. Assumes embeddings are L2-normalized.
    #[default]
    Cosine,
    /// Negated Euclidean distance (`s = -d`), so larger is still more relevant.
    L2,
}

/// Brute-force flat index over dense document embeddings.
pub struct DenseIndex {
    /// Document ID -> embedding vector, in the order documents were added.
    documents: Vec<(u32, Vec<f32>)>,
    metric: DenseMetric,
}

impl DenseIndex {
    /// Create a new dense index using cosine similarity.
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            metric: DenseMetric::Cosine,
        }
    }

    /// Create a new dense index using the given metric.
    pub fn with_metric(metric: DenseMetric) -> Self {
        Self {
            documents: Vec::new(),
            metric,
        }
    }

    pub fn metric(&self) -> DenseMetric {
        self.metric
    }

    /// Add a document with its dense embedding.
    ///
    /// For cosine similarity, `embedding` should be L2-normalized; the index
    /// does not normalize on the caller's behalf.
    pub fn add_document(&mut self, doc_id: u32, embedding: Vec<f32>) {
        self.documents.push((doc_id, embedding));
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            DenseMetric::Cosine => crate::simd::cosine(a, b),
            DenseMetric::L2 => -crate::simd::l2_distance(a, b),
        }
    }

    /// Score a document against a query embedding.
    pub fn score(&self, doc_id: u32, query_embedding: &[f32]) -> Option<f32> {
        self.documents
            .iter()
            .find(|(id, _)| *id == doc_id)
            .map(|(_, doc_embedding)| self.similarity(doc_embedding, query_embedding))
    }

    /// Score every document in the index against a query, in the order
    /// documents were added (corpus order). Unlike [`retrieve`](Self::retrieve),
    /// this never truncates to a top-k — the fusion ranker needs a score for
    /// every candidate to min-max normalize across.
    ///
    /// An empty query returns a zero vector of length `len()`.
    pub fn score_all(&self, query_embedding: &[f32]) -> Result<Vec<f32>, RetrieveError> {
        if query_embedding.is_empty() {
            return Ok(vec![0.0; self.documents.len()]);
        }
        let query_dim = query_embedding.len();
        self.documents
            .iter()
            .map(|(_, doc_embedding)| {
                if doc_embedding.len() != query_dim {
                    return Err(RetrieveError::DimensionMismatch {
                        query_dim,
                        doc_dim: doc_embedding.len(),
                    });
                }
                Ok(self.similarity(doc_embedding, query_embedding))
            })
            .collect()
    }

    /// Retrieve top-k documents for a query embedding, sorted by score descending.
    ///
    /// # Errors
    ///
    /// Returns `RetrieveError::EmptyQuery` if the query embedding is empty,
    /// `RetrieveError::EmptyIndex` if the index has no documents, or
    /// `RetrieveError::DimensionMismatch` if a document embedding's
    /// dimensionality doesn't match the query's.
    pub fn retrieve(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<(u32, f32)>, RetrieveError> {
        if query_embedding.is_empty() {
            return Err(RetrieveError::EmptyQuery);
        }
        if self.documents.is_empty() {
            return Err(RetrieveError::EmptyIndex);
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_dim = query_embedding.len();

        if k < self.documents.len() / 2 {
            use std::cmp::Reverse;
            use std::collections::BinaryHeap;

            #[derive(PartialEq)]
            struct FloatOrd(f32);
            impl Eq for FloatOrd {}
            impl PartialOrd for FloatOrd {
                fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                    Some(self.cmp(other))
                }
            }
            impl Ord for FloatOrd {
                fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                    self.0.partial_cmp(&other.0).unwrap_or(std::cmp::Ordering::Equal)
                }
            }

            let mut heap: BinaryHeap<Reverse<(FloatOrd, u32)>> = BinaryHeap::with_capacity(k + 1);

            for (doc_id, doc_embedding) in &self.documents {
                if doc_embedding.len() != query_dim {
                    return Err(RetrieveError::DimensionMismatch {
                        query_dim,
                        doc_dim: doc_embedding.len(),
                    });
                }
                let score = self.similarity(doc_embedding, query_embedding);
                if score.is_finite() && score > 0.0 {
                    if heap.len() < k {
                        heap.push(Reverse((FloatOrd(score), *doc_id)));
                    } else if let Some(&Reverse((FloatOrd(min_score), _))) = heap.peek() {
                        if score > min_score {
                            heap.pop();
                            heap.push(Reverse((FloatOrd(score), *doc_id)));
                        }
                    }
                }
            }

            let mut results: Vec<(u32, f32)> = heap
                .into_iter()
                .map(|Reverse((FloatOrd(score), doc_id))| (doc_id, score))
                .collect();
            results.sort_unstable_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            Ok(results)
        } else {
            let mut scored: Vec<(u32, f32)> = Vec::with_capacity(self.documents.len());
            for (doc_id, doc_embedding) in &self.documents {
                if doc_embedding.len() != query_dim {
                    return Err(RetrieveError::DimensionMismatch {
                        query_dim,
                        doc_dim: doc_embedding.len(),
                    });
                }
                scored.push((*doc_id, self.similarity(doc_embedding, query_embedding)));
            }
            scored.sort_unstable_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            Ok(scored.into_iter().take(k).collect())
        }
    }
}

impl Default for DenseIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "dense")]
impl Retriever for DenseIndex {
    type Query = [f32];

    fn retrieve(&self, query: &Self::Query, k: usize) -> Result<Vec<(u32, f32)>, RetrieveError> {
        self.retrieve(query, k)
    }
}

#[cfg(feature = "dense")]
impl RetrieverBuilder for DenseIndex {
    type Content = Vec<f32>;

    fn add_document(&mut self, doc_id: u32, content: Self::Content) -> Result<(), RetrieveError> {
        self.add_document(doc_id, content);
        Ok(())
    }
}

/// Plain-data mirror of `DenseIndex`, serializable for persistence.
///
/// `dim` and `embedding_model_id` are recorded alongside the vectors
/// themselves so that loading an artifact built against a different
/// embedding model is caught at load time instead of producing silently
/// meaningless scores.
#[cfg(feature = "persistence")]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct DenseSnapshot {
    pub documents: Vec<(u32, Vec<f32>)>,
    pub metric: DenseMetric,
    pub dim: usize,
    pub embedding_model_id: String,
}

#[cfg(feature = "persistence")]
impl DenseSnapshot {
    fn build(index: &DenseIndex, embedding_model_id: &str) -> Self {
        let dim = index.documents.first().map(|(_, v)| v.len()).unwrap_or(0);
        Self {
            documents: index.documents.clone(),
            metric: index.metric,
            dim,
            embedding_model_id: embedding_model_id.to_string(),
        }
    }
}

#[cfg(feature = "persistence")]
impl DenseIndex {
    /// `embedding_model_id` identifies the embedder that produced these
    /// vectors; it is checked against the caller's current embedder on
    /// [`DenseIndex::load`].
    pub fn save(
        &self,
        dir: &dyn crate::persistence::directory::Directory,
        path: &str,
        embedding_model_id: &str,
    ) -> Result<(), crate::persistence::error::PersistenceError> {
        let snapshot = DenseSnapshot::build(self, embedding_model_id);
        let body = postcard::to_allocvec(&snapshot)
            .map_err(|e| crate::persistence::error::PersistenceError::Serialization(e.to_string()))?;
        let checksum = crc32fast::hash(&body);
        let header = crate::persistence::format::IndexHeader::new(
            crate::persistence::format::IndexKind::Dense,
            self.documents.len() as u32,
            checksum,
        );
        let artifact = crate::persistence::format::encode_artifact(&header, &body)?;
        dir.atomic_write(path, &artifact)
    }

    /// Loads a persisted dense index, failing with
    /// `PersistenceError::InvalidConfig` if the artifact's recorded corpus
    /// size, dimensionality, or embedding model id does not match what the
    /// caller expects to be running with.
    pub fn load(
        dir: &dyn crate::persistence::directory::Directory,
        path: &str,
        expected_corpus_size: usize,
        expected_dim: usize,
        expected_embedding_model_id: &str,
    ) -> Result<Self, crate::persistence::error::PersistenceError> {
        use std::io::Read;
        let mut bytes = Vec::new();
        dir.open_file(path)?.read_to_end(&mut bytes)?;
        let (header, body) = crate::persistence::format::decode_artifact(&bytes)?;
        header.validate(crate::persistence::format::IndexKind::Dense)?;
        let snapshot: DenseSnapshot = postcard::from_bytes(body)
            .map_err(|e| crate::persistence::error::PersistenceError::Deserialization(e.to_string()))?;

        if snapshot.documents.len() != expected_corpus_size {
            return Err(crate::persistence::error::PersistenceError::InvalidConfig(format!(
                "dense index corpus size mismatch: artifact has {}, expected {}",
                snapshot.documents.len(),
                expected_corpus_size
            )));
        }
        if snapshot.dim != expected_dim {
            return Err(crate::persistence::error::PersistenceError::InvalidConfig(format!(
                "dense index dimension mismatch: artifact has {}, expected {}",
                snapshot.dim, expected_dim
            )));
        }
        if snapshot.embedding_model_id != expected_embedding_model_id {
            return Err(crate::persistence::error::PersistenceError::InvalidConfig(format!(
                "dense index embedding model mismatch: artifact built with {:?}, expected {:?}",
                snapshot.embedding_model_id, expected_embedding_model_id
            )));
        }

        Ok(Self {
            documents: snapshot.documents,
            metric: snapshot.metric,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_retrieval_cosine() {
        let mut index = DenseIndex::new();
        index.add_document(0, vec![1.0, 0.0]);
        index.add_document(1, vec![0.707, 0.707]);

        let query = vec![1.0, 0.0];
        let results = index.retrieve(&query, 10).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 0);
        assert!((results[0].1 - 1.0).abs() < 0.001);
        assert!((results[1].1 - 0.707).abs() < 0.01);
    }

    #[test]
    fn test_dense_retrieval_l2() {
        let mut index = DenseIndex::with_metric(DenseMetric::L2);
        index.add_document(0, vec![0.0, 0.0]);
        index.add_document(1, vec![3.0, 4.0]);

        let query = vec![0.0, 0.0];
        let results = index.retrieve(&query, 10).unwrap();

        // Document 0 is an exact match (distance 0 -> score 0), document 1 is
        // farther away (distance 5 -> score -5), so 0 ranks first.
        assert_eq!(results[0].0, 0);
        assert!((results[0].1 - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_score_all_empty_query_is_zero_vector() {
        let mut index = DenseIndex::new();
        index.add_document(0, vec![1.0, 0.0]);
        index.add_document(1, vec![0.0, 1.0]);

        let scores = index.score_all(&[]).unwrap();
        assert_eq!(scores, vec![0.0, 0.0]);
    }

    #[test]
    fn test_score_all_dimension_mismatch() {
        let mut index = DenseIndex::new();
        index.add_document(0, vec![1.0, 0.0, 0.0]);

        let err = index.score_all(&[1.0, 0.0]).unwrap_err();
        assert!(matches!(err, RetrieveError::DimensionMismatch { .. }));
    }

    #[cfg(feature = "persistence")]
    mod persistence_tests {
        use super::*;
        use crate::persistence::directory::MemoryDirectory;

        #[test]
        fn save_and_load_round_trips_scores() {
            let mut index = DenseIndex::with_metric(DenseMetric::L2);
            index.add_document(0, vec![1.0, 0.0]);
            index.add_document(1, vec![0.0, 1.0]);

            let dir = MemoryDirectory::new();
            index.save(&dir, "dense.idx", "hashing-embedder-v1").unwrap();

            let loaded = DenseIndex::load(&dir, "dense.idx", 2, 2, "hashing-embedder-v1").unwrap();
            assert_eq!(loaded.metric(), DenseMetric::L2);
            assert_eq!(loaded.score_all(&[1.0, 0.0]).unwrap(), index.score_all(&[1.0, 0.0]).unwrap());
        }

        #[test]
        fn load_rejects_corpus_size_mismatch() {
            let mut index = DenseIndex::new();
            index.add_document(0, vec![1.0, 0.0]);

            let dir = MemoryDirectory::new();
            index.save(&dir, "dense.idx", "hashing-embedder-v1").unwrap();

            let err = DenseIndex::load(&dir, "dense.idx", 5, 2, "hashing-embedder-v1").unwrap_err();
            assert!(matches!(err, crate::persistence::error::PersistenceError::InvalidConfig(_)));
        }

        #[test]
        fn load_rejects_dimension_mismatch() {
            let mut index = DenseIndex::new();
            index.add_document(0, vec![1.0, 0.0]);

            let dir = MemoryDirectory::new();
            index.save(&dir, "dense.idx", "hashing-embedder-v1").unwrap();

            let err = DenseIndex::load(&dir, "dense.idx", 1, 3, "hashing-embedder-v1").unwrap_err();
            assert!(matches!(err, crate::persistence::error::PersistenceError::InvalidConfig(_)));
        }

        #[test]
        fn load_rejects_embedding_model_mismatch() {
            let mut index = DenseIndex::new();
            index.add_document(0, vec![1.0, 0.0]);

            let dir = MemoryDirectory::new();
            index.save(&dir, "dense.idx", "hashing-embedder-v1").unwrap();

            let err = DenseIndex::load(&dir, "dense.idx", 1, 2, "other-embedder").unwrap_err();
            assert!(matches!(err, crate::persistence::error::PersistenceError::InvalidConfig(_)));
        }
    }
}
