//! Interfaces for the external models the pipeline calls out to. Concrete
//! implementations (a real embedding model, KeyBERT, an LLM reasoner) are
//! out of scope here; only the contract and its test doubles live in this
//! crate.

use crate::error::BugLocalizeError;

/// Embeds text into a fixed-dimension vector. Deterministic for a given
/// model id, used both at corpus-index build time and at query time.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, BugLocalizeError>;
    fn dim(&self) -> usize;
    /// Identifies the embedding model, recorded in the dense index's
    /// persistence artifact so a mismatched model on reload is caught.
    fn model_id(&self) -> &str;
}

/// Extracts up to `k` keywords from already-normalized text. May return
/// fewer than `k`.
pub trait KeywordExtractor: Send + Sync {
    fn extract(&self, text: &str, k: usize) -> Result<Vec<String>, BugLocalizeError>;
}

/// Rewrites raw bug-report text into a reasoning-enhanced query. Best
/// effort: an empty string return means "no rewrite", not a failure.
pub trait Reasoner: Send + Sync {
    fn reason(&self, raw_text: &str) -> Result<String, BugLocalizeError>;
}

/// An embedder that always returns a zero vector of a fixed dimension.
/// Useful for exercising the pipeline without a real model.
#[cfg(test)]
pub struct NullEmbedder {
    dim: usize,
}

#[cfg(test)]
impl NullEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

#[cfg(test)]
impl Embedder for NullEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, BugLocalizeError> {
        Ok(vec![0.0; self.dim])
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn model_id(&self) -> &str {
        "null-embedder"
    }
}

/// A keyword extractor that just returns the first `k` whitespace-separated
/// tokens of the input text, for deterministic pipeline tests.
#[cfg(test)]
pub struct FirstNKeywordExtractor;

#[cfg(test)]
impl KeywordExtractor for FirstNKeywordExtractor {
    fn extract(&self, text: &str, k: usize) -> Result<Vec<String>, BugLocalizeError> {
        Ok(text.split_whitespace().take(k).map(|s| s.to_string()).collect())
    }
}

/// A reasoner that echoes its input back unchanged.
#[cfg(test)]
pub struct EchoReasoner;

#[cfg(test)]
impl Reasoner for EchoReasoner {
    fn reason(&self, raw_text: &str) -> Result<String, BugLocalizeError> {
        Ok(raw_text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_embedder_returns_zero_vector_of_configured_dim() {
        let embedder = NullEmbedder::new(4);
        assert_eq!(embedder.embed("anything").unwrap(), vec![0.0; 4]);
        assert_eq!(embedder.dim(), 4);
    }

    #[test]
    fn first_n_keyword_extractor_truncates_to_k() {
        let extractor = FirstNKeywordExtractor;
        let keywords = extractor.extract("database connection timeout error", 2).unwrap();
        assert_eq!(keywords, vec!["database", "connection"]);
    }

    #[test]
    fn first_n_keyword_extractor_returns_fewer_if_input_is_short() {
        let extractor = FirstNKeywordExtractor;
        let keywords = extractor.extract("one", 5).unwrap();
        assert_eq!(keywords, vec!["one"]);
    }

    #[test]
    fn echo_reasoner_returns_input_unchanged() {
        let reasoner = EchoReasoner;
        assert_eq!(reasoner.reason("raw bug text").unwrap(), "raw bug text");
    }
}
