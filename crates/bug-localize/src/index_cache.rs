//! Load-or-build caching for the BM25 and dense indexes.
//!
//! spec.md §4.2/§4.3: the built index is serialized to a single on-disk
//! artifact keyed by the corpus directory path; on startup, if the artifact
//! exists it is loaded, otherwise the index is built and persisted. The
//! dense artifact additionally records `{corpus_size, dim, embedding_model_id}`
//! and fails the load with `IndexMismatch` if any of those disagree with the
//! current run.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::path::Path;

use rank_retrieve::bm25::InvertedIndex;
use rank_retrieve::dense::{DenseIndex, DenseMetric};
use rank_retrieve::persistence::directory::{Directory, FsDirectory};

use crate::collaborators::Embedder;
use crate::corpus::build_corpus;
use crate::error::BugLocalizeError;
use crate::model::Corpus;

/// Stable cache key for a corpus root: a hex-encoded hash of its
/// canonicalized path, so the same corpus directory resolves to the same
/// artifact names regardless of the working directory a run is launched
/// from.
fn corpus_cache_key(corpus_root: &Path) -> String {
    let canonical = corpus_root.canonicalize().unwrap_or_else(|_| corpus_root.to_path_buf());
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    canonical.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Build the corpus, then load both indexes from `cache_dir` if a matching
/// artifact pair exists there, falling back to building and persisting fresh
/// ones otherwise.
pub fn load_or_build_indexes(
    corpus_root: &Path,
    extensions: &HashSet<String>,
    stopwords: &HashSet<String>,
    embedder: &dyn Embedder,
    dense_metric: DenseMetric,
    cache_dir: &Path,
) -> Result<(Corpus, InvertedIndex, DenseIndex), BugLocalizeError> {
    let corpus = build_corpus(corpus_root, extensions, stopwords, embedder)?;

    let dir = FsDirectory::new(cache_dir)?;
    let key = corpus_cache_key(corpus_root);
    let bm25_path = format!("{}.bm25", key);
    let dense_path = format!("{}.dense", key);

    let bm25_index = if dir.exists(&bm25_path) {
        let loaded = InvertedIndex::load(&dir, &bm25_path)?;
        if loaded.num_docs() as usize == corpus.len() {
            loaded
        } else {
            build_and_save_bm25(&dir, &bm25_path, &corpus)?
        }
    } else {
        build_and_save_bm25(&dir, &bm25_path, &corpus)?
    };

    let dense_index = if dir.exists(&dense_path) {
        DenseIndex::load(&dir, &dense_path, corpus.len(), embedder.dim(), embedder.model_id())?
    } else {
        build_and_save_dense(&dir, &dense_path, &corpus, dense_metric, embedder.model_id())?
    };

    Ok((corpus, bm25_index, dense_index))
}

fn build_and_save_bm25(
    dir: &FsDirectory,
    path: &str,
    corpus: &Corpus,
) -> Result<InvertedIndex, BugLocalizeError> {
    let mut index = InvertedIndex::new();
    for (position, document) in corpus.documents().iter().enumerate() {
        index.add_document(position as u32, &document.tokens);
    }
    index.save(dir, path)?;
    Ok(index)
}

fn build_and_save_dense(
    dir: &FsDirectory,
    path: &str,
    corpus: &Corpus,
    metric: DenseMetric,
    embedding_model_id: &str,
) -> Result<DenseIndex, BugLocalizeError> {
    let mut index = DenseIndex::with_metric(metric);
    for (position, document) in corpus.documents().iter().enumerate() {
        index.add_document(position as u32, document.embedding.clone());
    }
    index.save(dir, path, embedding_model_id)?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::NullEmbedder;
    use std::fs;
    use std::io::Write;

    fn write_file(path: &Path, content: &str) {
        fs::File::create(path).unwrap().write_all(content.as_bytes()).unwrap();
    }

    fn temp_dir(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("bug_localize_index_cache_{}_{}", name, std::process::id()))
    }

    #[test]
    fn builds_and_persists_then_reloads_from_cache() {
        let corpus_root = temp_dir("corpus_a");
        let cache_dir = temp_dir("cache_a");
        fs::create_dir_all(&corpus_root).unwrap();
        write_file(&corpus_root.join("a.py"), "def connect(): pass");

        let extensions: HashSet<String> = ["py".to_string()].into_iter().collect();
        let stopwords = HashSet::new();
        let embedder = NullEmbedder::new(4);

        let (corpus1, bm251, dense1) =
            load_or_build_indexes(&corpus_root, &extensions, &stopwords, &embedder, DenseMetric::Cosine, &cache_dir).unwrap();
        assert_eq!(corpus1.len(), 1);
        assert_eq!(bm251.num_docs(), 1);
        assert_eq!(dense1.len(), 1);

        // Second call with the same corpus root should reload the persisted
        // artifacts rather than rebuilding.
        let (corpus2, bm252, dense2) =
            load_or_build_indexes(&corpus_root, &extensions, &stopwords, &embedder, DenseMetric::Cosine, &cache_dir).unwrap();
        assert_eq!(corpus2.len(), corpus1.len());
        assert_eq!(bm252.num_docs(), bm251.num_docs());
        assert_eq!(dense2.len(), dense1.len());

        fs::remove_dir_all(&corpus_root).ok();
        fs::remove_dir_all(&cache_dir).ok();
    }

    #[test]
    fn embedding_model_change_is_reported_as_index_mismatch() {
        let corpus_root = temp_dir("corpus_b");
        let cache_dir = temp_dir("cache_b");
        fs::create_dir_all(&corpus_root).unwrap();
        write_file(&corpus_root.join("a.py"), "def connect(): pass");

        let extensions: HashSet<String> = ["py".to_string()].into_iter().collect();
        let stopwords = HashSet::new();

        load_or_build_indexes(&corpus_root, &extensions, &stopwords, &NullEmbedder::new(4), DenseMetric::Cosine, &cache_dir)
            .unwrap();

        struct OtherEmbedder;
        impl Embedder for OtherEmbedder {
            fn embed(&self, _text: &str) -> Result<Vec<f32>, BugLocalizeError> {
                Ok(vec![0.0; 4])
            }
            fn dim(&self) -> usize {
                4
            }
            fn model_id(&self) -> &str {
                "other-embedder"
            }
        }

        let err = load_or_build_indexes(&corpus_root, &extensions, &stopwords, &OtherEmbedder, DenseMetric::Cosine, &cache_dir)
            .unwrap_err();
        assert!(matches!(err, BugLocalizeError::IndexMismatch(_)));

        fs::remove_dir_all(&corpus_root).ok();
        fs::remove_dir_all(&cache_dir).ok();
    }
}
