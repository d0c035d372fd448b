//! Hybrid BM25/dense bug-localization pipeline.
//!
//! Wires the first-stage retrievers in [`rank_retrieve`] and the fusion
//! ranker in [`rank_fusion`] into an end-to-end bug-localization system:
//! normalize a bug report into query token variants ([`query`]), fuse BM25
//! and dense scores per variant, and write ranked-result files the
//! evaluator in [`rank_eval`] can score.
//!
//! [`pipeline::Pipeline`] runs every bug report through a four-stage
//! concurrent pipeline (read, process, query-gen, localize) so that corpus
//! indexing and per-bug work overlap instead of running strictly in
//! sequence.

pub mod bugreport_io;
pub mod collaborators;
pub mod config;
pub mod corpus;
pub mod error;
pub mod index_cache;
pub mod log;
pub mod model;
pub mod pipeline;
pub mod query;
pub mod text;

pub use bugreport_io::discover_bug_reports;
pub use collaborators::{Embedder, KeywordExtractor, Reasoner};
pub use config::{Config, DocumentLimit};
pub use error::{exit_code, BugLocalizeError};
pub use index_cache::load_or_build_indexes;
pub use model::{BugReport, Corpus, Document, VariantDescriptor};
pub use pipeline::{Pipeline, PipelineReport};

/// Re-exports for `use bug_localize::prelude::*;`.
pub mod prelude {
    pub use crate::bugreport_io::discover_bug_reports;
    pub use crate::config::{Config, DocumentLimit};
    pub use crate::error::BugLocalizeError;
    pub use crate::model::{BugReport, Corpus, Document, VariantDescriptor};
    pub use crate::pipeline::{Pipeline, PipelineReport};
    pub use crate::query::QueryBuilder;
}
