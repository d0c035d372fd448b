//! # rank-rank
//!
//! The unified entry point for the hybrid BM25/dense bug-localization
//! retrieval engine.
//!
//! This crate has two jobs:
//! 1. **Facade**: re-exports `rank-retrieve`, `rank-fusion`, `rank-eval`, and
//!    `bug-localize` into a single namespace.
//! 2. **Driver**: the `rank-rank` binary (feature `cli`) builds a corpus
//!    index, runs the pipeline over a directory of bug reports, and scores
//!    the resulting ranked-result files against ground truth.
//!
//! # Architecture
//!
//! 1. **Retrieve** (`rank-retrieve`): BM25 sparse index + flat dense index,
//!    both scored across the whole corpus per query.
//! 2. **Fuse** (`rank-fusion`): per-query min-max normalization and a
//!    weighted blend of the two score vectors.
//! 3. **Localize** (`bug-localize`): text normalization, the six query
//!    variants, and the stage-parallel pipeline that ties retrieve and fuse
//!    together for a directory of bug reports.
//! 4. **Eval** (`rank-eval`): ground-truth loading, existence filtering, and
//!    Hit@K/MRR/MAP computation over the pipeline's output.

pub mod pipeline;

/// Re-export of the first-stage retrievers.
pub mod retrieve {
    pub use rank_retrieve::*;
}

/// Re-export of the hybrid score-fusion ranker.
pub mod fusion {
    pub use rank_fusion::*;
}

/// Re-export of the ground-truth evaluator.
pub mod eval {
    pub use rank_eval::*;
}

/// Re-export of the query builder, pipeline orchestrator, and data model.
pub mod localize {
    pub use bug_localize::*;
}

pub mod prelude {
    pub use crate::retrieve::prelude::*;

    pub use crate::fusion::{weighted, weighted_k, weighted_multi, weighted_multi_k, FusionError, RankedResult, WeightedConfig};

    pub use crate::eval::prelude::*;

    pub use crate::localize::prelude::*;

    pub use crate::pipeline::run_pipeline;
}
