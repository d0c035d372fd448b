//! Ground-truth loading and ranked-retrieval evaluation.
//!
//! `binary` holds the per-query metric primitives (Hit@K, MRR, MAP building
//! blocks); `ground_truth` loads and existence-filters the ground-truth file
//! format; `evaluator` means the per-query metrics over the bugs a run
//! considers and tracks baseline-vs-extended query-expansion outcomes.

pub mod binary;
pub mod error;
pub mod evaluator;
pub mod ground_truth;
pub mod result_file;

pub use error::EvalError;
pub use evaluator::{BugRank, Evaluator, QeStats, VariantMetrics, VariantScore};
pub use ground_truth::{normalize_file_id, ExistenceReport, GroundTruth};
pub use result_file::{load_ranked_result, parse_ranked_result};

/// Re-exports for `use rank_eval::prelude::*;`.
pub mod prelude {
    pub use crate::binary::{average_precision, hit_at_k, precision_at_k, reciprocal_rank, recall_at_k};
    pub use crate::{EvalError, Evaluator, ExistenceReport, GroundTruth, VariantMetrics};
}
