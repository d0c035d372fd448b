//! Runtime configuration: BM25/fusion parameters, pipeline sizing, and the
//! corpus/stopwords inputs.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::BugLocalizeError;
use rank_retrieve::dense::DenseMetric;

/// How many documents the hybrid ranker returns per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentLimit {
    N(usize),
    All,
}

impl DocumentLimit {
    /// Resolve against the corpus size for a call into `rank_fusion::weighted_k`.
    pub fn resolve(&self, corpus_size: usize) -> usize {
        match self {
            DocumentLimit::N(n) => (*n).min(corpus_size),
            DocumentLimit::All => corpus_size,
        }
    }
}

fn default_bm25_k1() -> f32 {
    1.5
}

fn default_bm25_b() -> f32 {
    0.75
}

fn default_top_n_keywords() -> usize {
    10
}

fn default_pipeline_parallelism() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    8
}

fn default_corpus_extensions() -> Vec<String> {
    ["py", "cpp", "c", "h", "hpp", "java", "js", "ts", "cs", "go", "php", "vue"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_index_cache_dir() -> PathBuf {
    PathBuf::from(".rank-rank-cache")
}

/// Every recognized configuration option from spec.md §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_bm25_k1")]
    pub bm25_k1: f32,
    #[serde(default = "default_bm25_b")]
    pub bm25_b: f32,
    pub bm25_weight: f32,
    pub faiss_weight: f32,
    #[serde(default = "default_top_n_keywords")]
    pub top_n_keywords: usize,
    pub top_n_documents: DocumentLimit,
    #[serde(default)]
    pub dense_metric: DenseMetric,
    #[serde(default = "default_pipeline_parallelism")]
    pub pipeline_parallelism: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    pub stopwords_path: PathBuf,
    #[serde(default = "default_corpus_extensions")]
    pub corpus_extensions: Vec<String>,
    /// Directory persisted BM25/dense index artifacts are cached under, keyed
    /// per corpus root. See `bug_localize::index_cache`.
    #[serde(default = "default_index_cache_dir")]
    pub index_cache_dir: PathBuf,
}

impl Config {
    /// `bm25_weight + faiss_weight` must sum to 1.0, both weights must be in
    /// `[0, 1]`, and sizing options must be positive. Returns
    /// `BugLocalizeError::ConfigInvalid` otherwise.
    pub fn validate(&self) -> Result<(), BugLocalizeError> {
        if !(0.0..=1.0).contains(&self.bm25_weight) || !(0.0..=1.0).contains(&self.faiss_weight) {
            return Err(BugLocalizeError::ConfigInvalid(
                "bm25_weight and faiss_weight must each be in [0, 1]".to_string(),
            ));
        }
        if (self.bm25_weight + self.faiss_weight - 1.0).abs() > 1e-4 {
            return Err(BugLocalizeError::ConfigInvalid(format!(
                "bm25_weight ({}) + faiss_weight ({}) must sum to 1.0",
                self.bm25_weight, self.faiss_weight
            )));
        }
        if self.top_n_keywords == 0 {
            return Err(BugLocalizeError::ConfigInvalid("top_n_keywords must be >= 1".to_string()));
        }
        if let DocumentLimit::N(n) = self.top_n_documents {
            if n == 0 {
                return Err(BugLocalizeError::ConfigInvalid("top_n_documents must be >= 1 or \"all\"".to_string()));
            }
        }
        if self.pipeline_parallelism == 0 {
            return Err(BugLocalizeError::ConfigInvalid("pipeline_parallelism must be >= 1".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(BugLocalizeError::ConfigInvalid("queue_capacity must be >= 1".to_string()));
        }
        Ok(())
    }

    pub fn corpus_extensions_set(&self) -> HashSet<String> {
        self.corpus_extensions.iter().cloned().collect()
    }

    pub fn load(path: &std::path::Path) -> Result<Self, BugLocalizeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BugLocalizeError::IoUnreadable(format!("{}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| BugLocalizeError::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bm25_k1: default_bm25_k1(),
            bm25_b: default_bm25_b(),
            bm25_weight: 0.5,
            faiss_weight: 0.5,
            top_n_keywords: default_top_n_keywords(),
            top_n_documents: DocumentLimit::N(10),
            dense_metric: DenseMetric::default(),
            pipeline_parallelism: default_pipeline_parallelism(),
            queue_capacity: default_queue_capacity(),
            stopwords_path: PathBuf::from("stopwords.txt"),
            corpus_extensions: default_corpus_extensions(),
            index_cache_dir: default_index_cache_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn weights_must_sum_to_one() {
        let mut config = Config::default();
        config.bm25_weight = 0.6;
        config.faiss_weight = 0.6;
        assert!(matches!(config.validate(), Err(BugLocalizeError::ConfigInvalid(_))));
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let mut config = Config::default();
        config.pipeline_parallelism = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn document_limit_resolves_against_corpus_size() {
        assert_eq!(DocumentLimit::N(10).resolve(3), 3);
        assert_eq!(DocumentLimit::N(10).resolve(100), 10);
        assert_eq!(DocumentLimit::All.resolve(42), 42);
    }

    #[test]
    fn parses_from_toml() {
        let toml_src = r#"
            bm25_weight = 0.6
            faiss_weight = 0.4
            top_n_documents = { n = 20 }
            stopwords_path = "stop_words_english.txt"
        "#;
        let config: Config = toml::from_str(toml_src).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.bm25_k1, 1.5);
        assert_eq!(config.top_n_documents, DocumentLimit::N(20));
    }
}
