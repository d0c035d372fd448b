//! Wires `bug-localize`'s corpus builder and [`bug_localize::Pipeline`] into
//! one entry point: build the indexes, discover bug reports, run the stage-
//! parallel pipeline.
//!
//! The external collaborators (embedder, keyword extractor, reasoner) are
//! out of scope for this workspace (spec-level interfaces only); callers
//! supply their own implementations of [`bug_localize::Embedder`],
//! [`bug_localize::KeywordExtractor`], and [`bug_localize::Reasoner`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bug_localize::{BugLocalizeError, Config, Embedder, KeywordExtractor, PipelineReport, Reasoner};

/// Build the corpus and both indexes, then run the pipeline over every bug
/// report found under `bug_reports_root`. Returns before reading any bug
/// report if corpus or index construction fails (§4.6: index-build failure
/// is fatal).
pub async fn run_pipeline(
    config: Config,
    corpus_root: &Path,
    bug_reports_root: &Path,
    output_root: PathBuf,
    embedder: Arc<dyn Embedder>,
    keyword_extractor: Arc<dyn KeywordExtractor>,
    reasoner: Arc<dyn Reasoner>,
) -> Result<PipelineReport, BugLocalizeError> {
    config.validate()?;

    let stopwords: HashSet<String> = bug_localize::text::load_stopwords(&config.stopwords_path)?;
    let extensions = config.corpus_extensions_set();

    let corpus_root = corpus_root.to_path_buf();
    let embedder_for_build = embedder.clone();
    let dense_metric = config.dense_metric;
    let index_cache_dir = config.index_cache_dir.clone();
    let (corpus, bm25_index, dense_index) = {
        let stopwords = stopwords.clone();
        tokio::task::spawn_blocking(move || {
            bug_localize::index_cache::load_or_build_indexes(
                &corpus_root,
                &extensions,
                &stopwords,
                embedder_for_build.as_ref(),
                dense_metric,
                &index_cache_dir,
            )
        })
        .await
        .map_err(|e| BugLocalizeError::IoUnreadable(e.to_string()))??
    };

    let bug_reports = bug_localize::discover_bug_reports(bug_reports_root)?;

    let log = Arc::new(bug_localize::log::LogSink::new());
    let pipeline = bug_localize::Pipeline::new(
        Arc::new(corpus),
        Arc::new(bm25_index),
        Arc::new(dense_index),
        config,
        Arc::new(stopwords),
        embedder,
        keyword_extractor,
        reasoner,
        log,
        output_root,
    );

    Ok(pipeline.run(bug_reports).await)
}
