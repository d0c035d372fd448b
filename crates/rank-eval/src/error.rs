//! Error types for ground-truth loading and evaluation.

use std::fmt;

/// Errors that can occur while loading ground truth or evaluating rankings.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A ground-truth or ranked-result file could not be read.
    IoUnreadable(String),
    /// A ground-truth file's `<bug_id> <count>` header line was malformed.
    MalformedGroundTruth(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::IoUnreadable(path) => write!(f, "could not read file: {}", path),
            EvalError::MalformedGroundTruth(line) => {
                write!(f, "malformed ground truth line: {:?}", line)
            }
        }
    }
}

impl std::error::Error for EvalError {}

impl From<std::io::Error> for EvalError {
    fn from(e: std::io::Error) -> Self {
        EvalError::IoUnreadable(e.to_string())
    }
}
