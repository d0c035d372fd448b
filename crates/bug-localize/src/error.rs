//! Error kinds for the bug-localization pipeline.

use std::fmt;

/// Top-level error type. Variants map onto the exit codes in spec.md §6:
/// `ConfigInvalid -> 2`, `CorpusEmpty -> 3`, `IndexMismatch -> 4`,
/// `EmbedderFailed`/`ReasonerFailed` -> 5.
#[derive(Debug, Clone, PartialEq)]
pub enum BugLocalizeError {
    ConfigInvalid(String),
    CorpusEmpty(String),
    IoUnreadable(String),
    IndexMismatch(String),
    EmbedderFailed(String),
    ReasonerFailed(String),
    /// Both BM25 and dense score vectors were all-zero for a query. Not
    /// surfaced as a pipeline failure; the caller yields an empty
    /// `RankedResult` instead of propagating this.
    RankingDegenerate,
    Fusion(rank_fusion::FusionError),
    Retrieve(rank_retrieve::RetrieveError),
    Eval(rank_eval::EvalError),
}

impl fmt::Display for BugLocalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BugLocalizeError::ConfigInvalid(msg) => write!(f, "invalid configuration: {}", msg),
            BugLocalizeError::CorpusEmpty(msg) => write!(f, "empty corpus: {}", msg),
            BugLocalizeError::IoUnreadable(msg) => write!(f, "unreadable input: {}", msg),
            BugLocalizeError::IndexMismatch(msg) => write!(f, "index artifact mismatch: {}", msg),
            BugLocalizeError::EmbedderFailed(msg) => write!(f, "embedder failed: {}", msg),
            BugLocalizeError::ReasonerFailed(msg) => write!(f, "reasoner failed: {}", msg),
            BugLocalizeError::RankingDegenerate => write!(f, "ranking degenerate: both score vectors were constant"),
            BugLocalizeError::Fusion(e) => write!(f, "fusion error: {}", e),
            BugLocalizeError::Retrieve(e) => write!(f, "retrieval error: {}", e),
            BugLocalizeError::Eval(e) => write!(f, "evaluation error: {}", e),
        }
    }
}

impl std::error::Error for BugLocalizeError {}

impl From<rank_fusion::FusionError> for BugLocalizeError {
    fn from(e: rank_fusion::FusionError) -> Self {
        BugLocalizeError::Fusion(e)
    }
}

impl From<rank_retrieve::RetrieveError> for BugLocalizeError {
    fn from(e: rank_retrieve::RetrieveError) -> Self {
        BugLocalizeError::Retrieve(e)
    }
}

impl From<rank_eval::EvalError> for BugLocalizeError {
    fn from(e: rank_eval::EvalError) -> Self {
        BugLocalizeError::Eval(e)
    }
}

impl From<std::io::Error> for BugLocalizeError {
    fn from(e: std::io::Error) -> Self {
        BugLocalizeError::IoUnreadable(e.to_string())
    }
}

impl From<rank_retrieve::persistence::PersistenceError> for BugLocalizeError {
    fn from(e: rank_retrieve::persistence::PersistenceError) -> Self {
        use rank_retrieve::persistence::PersistenceError;
        match e {
            PersistenceError::InvalidConfig(msg) => BugLocalizeError::IndexMismatch(msg),
            PersistenceError::ChecksumMismatch { expected, actual } => BugLocalizeError::IndexMismatch(format!(
                "index artifact checksum mismatch: expected {}, got {}",
                expected, actual
            )),
            PersistenceError::Format { message, .. } => BugLocalizeError::IndexMismatch(message),
            other => BugLocalizeError::IoUnreadable(other.to_string()),
        }
    }
}

/// Maps an error to the process exit code it implies, per spec.md §6.
pub fn exit_code(err: &BugLocalizeError) -> i32 {
    match err {
        BugLocalizeError::ConfigInvalid(_) => 2,
        BugLocalizeError::CorpusEmpty(_) => 3,
        BugLocalizeError::IndexMismatch(_) => 4,
        BugLocalizeError::EmbedderFailed(_) | BugLocalizeError::ReasonerFailed(_) => 5,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_spec_mapping() {
        assert_eq!(exit_code(&BugLocalizeError::ConfigInvalid("x".into())), 2);
        assert_eq!(exit_code(&BugLocalizeError::CorpusEmpty("x".into())), 3);
        assert_eq!(exit_code(&BugLocalizeError::IndexMismatch("x".into())), 4);
        assert_eq!(exit_code(&BugLocalizeError::EmbedderFailed("x".into())), 5);
        assert_eq!(exit_code(&BugLocalizeError::ReasonerFailed("x".into())), 5);
    }
}
