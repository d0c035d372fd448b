//! Stage-parallel pipeline orchestrator: `READ -> PROCESS -> QUERY-GEN ->
//! LOCALIZE`, built on bounded `tokio::sync::mpsc` channels with CPU-bound
//! work offloaded to `tokio::task::spawn_blocking`, matching the
//! "coroutines and queues" design in spec.md §9.
//!
//! Per-stage concurrency: READ/PROCESS = 1 each; QUERY-GEN = 1 task per
//! variant family (basic/keybert/reason); LOCALIZE = `P` (configurable).
//! Shutdown is drain-then-cancel: closing a channel's sender lets its
//! receiver's `recv` loop drain whatever is already queued, then return
//! `None` and exit — there is no separate cancellation signal to juggle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::bugreport_io::{read_bug_report, write_ranked_result};
use crate::collaborators::{Embedder, KeywordExtractor, Reasoner};
use crate::config::Config;
use crate::error::BugLocalizeError;
use crate::log::{LogSink, Phase};
use crate::model::{BugReport, Corpus, VariantDescriptor};
use crate::query::QueryBuilder;
use rank_fusion::{weighted_k, RankedResult, WeightedConfig};
use rank_retrieve::bm25::InvertedIndex;
use rank_retrieve::dense::DenseIndex;

/// Summary of a completed pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub succeeded: usize,
    pub failed: usize,
}

struct Shared {
    corpus: Arc<Corpus>,
    bm25_index: Arc<InvertedIndex>,
    dense_index: Arc<DenseIndex>,
    config: Config,
    stopwords: Arc<std::collections::HashSet<String>>,
    embedder: Arc<dyn Embedder>,
    keyword_extractor: Arc<dyn KeywordExtractor>,
    reasoner: Arc<dyn Reasoner>,
    log: Arc<LogSink>,
    output_root: PathBuf,
}

/// The staged pipeline. All shared state (corpus, indexes, stopwords) is
/// immutable and read concurrently by every worker without locking; the only
/// synchronized state is the bounded queues and the log sink.
pub struct Pipeline {
    shared: Arc<Shared>,
}

const BASIC: &str = "basic";
const KEYBERT: &str = "keybert";
const REASON: &str = "reason";
const QUERY_FAMILIES: [&str; 3] = [BASIC, KEYBERT, REASON];

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        corpus: Arc<Corpus>,
        bm25_index: Arc<InvertedIndex>,
        dense_index: Arc<DenseIndex>,
        config: Config,
        stopwords: Arc<std::collections::HashSet<String>>,
        embedder: Arc<dyn Embedder>,
        keyword_extractor: Arc<dyn KeywordExtractor>,
        reasoner: Arc<dyn Reasoner>,
        log: Arc<LogSink>,
        output_root: PathBuf,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                corpus,
                bm25_index,
                dense_index,
                config,
                stopwords,
                embedder,
                keyword_extractor,
                reasoner,
                log,
                output_root,
            }),
        }
    }

    /// Run the full pipeline over every `(bug_id, bug_dir)` pair. Returns
    /// once every bug has been read, processed, query-expanded, and
    /// localized (or failed and been logged). A per-bug failure never stops
    /// the run; only channel setup failures are fatal.
    pub async fn run(&self, bug_reports: Vec<(String, PathBuf)>) -> PipelineReport {
        let queue_capacity = self.shared.config.queue_capacity.max(1);

        let (read_tx, read_rx) = mpsc::channel::<(String, PathBuf)>(queue_capacity);
        let (process_tx, process_rx) = mpsc::channel::<BugReport>(queue_capacity);

        let mut family_txs = HashMap::new();
        let mut family_rxs = HashMap::new();
        for family in QUERY_FAMILIES {
            let (tx, rx) = mpsc::channel::<BugReport>(queue_capacity);
            family_txs.insert(family, tx);
            family_rxs.insert(family, rx);
        }

        let (localize_tx, localize_rx) = mpsc::channel::<BugReport>(queue_capacity);

        let report = Arc::new(Mutex::new(PipelineReport::default()));

        let mut handles: Vec<JoinHandle<()>> = Vec::new();

        handles.push(self.spawn_read_stage(read_rx, process_tx));
        handles.push(self.spawn_process_stage(process_rx, family_txs));

        let join_state: Arc<Mutex<HashMap<String, (BugReport, usize)>>> = Arc::new(Mutex::new(HashMap::new()));
        for family in QUERY_FAMILIES {
            let rx = family_rxs.remove(family).expect("every family channel was just inserted");
            handles.push(self.spawn_query_gen_stage(family, rx, localize_tx.clone(), join_state.clone()));
        }
        drop(localize_tx);

        let parallelism = self.shared.config.pipeline_parallelism.max(1);
        let localize_rx = Arc::new(Mutex::new(localize_rx));
        for _ in 0..parallelism {
            handles.push(self.spawn_localize_stage(localize_rx.clone(), report.clone()));
        }

        for (bug_id, bug_dir) in bug_reports {
            if read_tx.send((bug_id, bug_dir)).await.is_err() {
                break;
            }
        }
        drop(read_tx);

        for handle in handles {
            let _ = handle.await;
        }

        Arc::try_unwrap(report).map(|m| m.into_inner()).unwrap_or_default()
    }

    fn spawn_read_stage(&self, mut rx: mpsc::Receiver<(String, PathBuf)>, tx: mpsc::Sender<BugReport>) -> JoinHandle<()> {
        let shared = self.shared.clone();
        tokio::spawn(async move {
            while let Some((bug_id, bug_dir)) = rx.recv().await {
                shared.log.record("read", &bug_id, Phase::Start).await;
                let result = tokio::task::spawn_blocking(move || read_bug_report(&bug_dir, &bug_id)).await;
                match result {
                    Ok(Ok(bug)) => {
                        shared.log.record("read", &bug.id, Phase::Done).await;
                        if tx.send(bug).await.is_err() {
                            break;
                        }
                    }
                    Ok(Err(e)) => shared.log.record_error("read", "unknown", &format!("{:?}", e)).await,
                    Err(join_err) => shared.log.record_error("read", "unknown", &join_err.to_string()).await,
                }
            }
        })
    }

    fn spawn_process_stage(&self, mut rx: mpsc::Receiver<BugReport>, family_txs: HashMap<&'static str, mpsc::Sender<BugReport>>) -> JoinHandle<()> {
        let shared = self.shared.clone();
        tokio::spawn(async move {
            while let Some(bug) = rx.recv().await {
                shared.log.record("process", &bug.id, Phase::Start).await;
                shared.log.record("process", &bug.id, Phase::Done).await;
                for family in QUERY_FAMILIES {
                    let tx = family_txs.get(family).expect("every family has a channel");
                    if tx.send(bug.clone()).await.is_err() {
                        shared.log.record_error("process", &bug.id, "QueryGenChannelClosed").await;
                    }
                }
            }
        })
    }

    fn spawn_query_gen_stage(
        &self,
        family: &'static str,
        mut rx: mpsc::Receiver<BugReport>,
        localize_tx: mpsc::Sender<BugReport>,
        join_state: Arc<Mutex<HashMap<String, (BugReport, usize)>>>,
    ) -> JoinHandle<()> {
        let shared = self.shared.clone();
        tokio::spawn(async move {
            while let Some(mut bug) = rx.recv().await {
                shared.log.record("query_gen", &bug.id, Phase::Start).await;

                let stopwords = shared.stopwords.clone();
                let keyword_extractor = shared.keyword_extractor.clone();
                let reasoner = shared.reasoner.clone();
                let top_n_keywords = shared.config.top_n_keywords;
                let family_variants = tokio::task::spawn_blocking(move || {
                    let builder = QueryBuilder::new(&stopwords, top_n_keywords, keyword_extractor.as_ref(), reasoner.as_ref());
                    let mut partial = BugReport { id: bug.id.clone(), ..Default::default() };
                    std::mem::swap(&mut partial.raw_text, &mut bug.raw_text);
                    std::mem::swap(&mut partial.extended_text, &mut bug.extended_text);
                    let descriptor_baseline = VariantDescriptor::new(family, "baseline");
                    let descriptor_extended = VariantDescriptor::new(family, "extended");
                    builder.build_all(&mut partial).ok();
                    let baseline = partial.variants.remove(&descriptor_baseline.name).unwrap_or_default();
                    let extended = partial.variants.remove(&descriptor_extended.name).unwrap_or_default();
                    (descriptor_baseline.name, baseline, descriptor_extended.name, extended, partial.raw_text, partial.extended_text)
                })
                .await;

                let Ok((baseline_name, baseline_tokens, extended_name, extended_tokens, raw_text, extended_text)) = family_variants else {
                    shared.log.record_error("query_gen", &bug.id, "PanicInQueryBuilder").await;
                    continue;
                };

                shared.log.record("query_gen", &bug.id, Phase::Done).await;

                let mut state = join_state.lock().await;
                let entry = state.entry(bug.id.clone()).or_insert_with(|| {
                    (BugReport::new(bug.id.clone(), raw_text.clone(), extended_text.clone()), 0)
                });
                entry.0.variants.insert(baseline_name, baseline_tokens);
                entry.0.variants.insert(extended_name, extended_tokens);
                entry.1 += 1;

                if entry.1 == QUERY_FAMILIES.len() {
                    let (merged, _) = state.remove(&bug.id).expect("just inserted above");
                    drop(state);
                    if localize_tx.send(merged).await.is_err() {
                        shared.log.record_error("query_gen", &bug.id, "LocalizeChannelClosed").await;
                    }
                }
            }
        })
    }

    fn spawn_localize_stage(&self, rx: Arc<Mutex<mpsc::Receiver<BugReport>>>, report: Arc<Mutex<PipelineReport>>) -> JoinHandle<()> {
        let shared = self.shared.clone();
        tokio::spawn(async move {
            loop {
                let bug = {
                    let mut guard = rx.lock().await;
                    guard.recv().await
                };
                let Some(bug) = bug else { break };

                shared.log.record("localize", &bug.id, Phase::Start).await;
                let mut any_failed = false;
                for descriptor in VariantDescriptor::all() {
                    let Some(tokens) = bug.variants.get(&descriptor.name) else { continue };
                    match localize_variant(&shared, tokens).await {
                        Ok(results) => {
                            let path = shared
                                .output_root
                                .join(&bug.id)
                                .join(format!("{}_{}.txt", bug.id, descriptor.result_suffix));
                            if let Err(e) = write_ranked_result(&path, &shared.corpus, &results) {
                                any_failed = true;
                                shared.log.record_error("localize", &bug.id, &format!("{:?}", e)).await;
                            }
                        }
                        Err(e) => {
                            any_failed = true;
                            shared.log.record_error("localize", &bug.id, &format!("{:?}", e)).await;
                        }
                    }
                }
                shared.log.record("localize", &bug.id, Phase::Done).await;

                let mut rep = report.lock().await;
                if any_failed {
                    rep.failed += 1;
                } else {
                    rep.succeeded += 1;
                }
            }
        })
    }
}

/// Score one query variant against both indexes and fuse. Returns an empty
/// ranking, not an error, for an empty query (per spec.md §4.5).
async fn localize_variant(shared: &Shared, tokens: &[String]) -> Result<Vec<RankedResult>, BugLocalizeError> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let bm25_index = shared.bm25_index.clone();
    let bm25_params = rank_retrieve::bm25::Bm25Params { k1: shared.config.bm25_k1, b: shared.config.bm25_b };
    let query_terms = tokens.to_vec();
    let bm25_scores = tokio::task::spawn_blocking(move || bm25_index.score_all(&query_terms, bm25_params))
        .await
        .map_err(|e| BugLocalizeError::IoUnreadable(e.to_string()))?;

    let query_text = tokens.join(" ");
    let query_embedding = shared.embedder.embed(&query_text)?;

    let dense_index = shared.dense_index.clone();
    let dense_scores = tokio::task::spawn_blocking(move || dense_index.score_all(&query_embedding))
        .await
        .map_err(|e| BugLocalizeError::IoUnreadable(e.to_string()))??;

    let config = WeightedConfig::new(shared.config.bm25_weight, shared.config.faiss_weight)?;
    let top_k = shared.config.top_n_documents.resolve(shared.corpus.len());

    let results = weighted_k(&bm25_scores, &dense_scores, config, top_k)?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{EchoReasoner, FirstNKeywordExtractor, NullEmbedder};
    use crate::model::Document;
    use rank_retrieve::dense::DenseMetric;
    use std::collections::HashSet;

    fn build_shared(corpus_size: usize) -> Arc<Shared> {
        let mut corpus = Corpus::new();
        let mut bm25 = InvertedIndex::new();
        let mut dense = DenseIndex::with_metric(DenseMetric::Cosine);
        for i in 0..corpus_size {
            let tokens = vec![format!("term{}", i), "shared".to_string()];
            bm25.add_document(i as u32, &tokens);
            dense.add_document(i as u32, vec![1.0, i as f32]);
            corpus.push(Document { id: format!("file{}.py", i), raw_text: String::new(), tokens, embedding: vec![1.0, i as f32] });
        }

        Arc::new(Shared {
            corpus: Arc::new(corpus),
            bm25_index: Arc::new(bm25),
            dense_index: Arc::new(dense),
            config: Config { bm25_weight: 0.5, faiss_weight: 0.5, ..Config::default() },
            stopwords: Arc::new(HashSet::new()),
            embedder: Arc::new(NullEmbedder::new(2)),
            keyword_extractor: Arc::new(FirstNKeywordExtractor),
            reasoner: Arc::new(EchoReasoner),
            log: Arc::new(LogSink::new()),
            output_root: std::env::temp_dir(),
        })
    }

    #[tokio::test]
    async fn localize_variant_returns_empty_ranking_for_empty_query() {
        let shared = build_shared(3);
        let results = localize_variant(&shared, &[]).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn localize_variant_returns_bounded_ranking_for_nonempty_query() {
        let shared = build_shared(3);
        let results = localize_variant(&shared, &[String::from("term1")]).await.unwrap();
        assert!(results.len() <= 3);
        assert!(results.iter().all(|r| r.score.is_finite()));
    }

    #[tokio::test]
    async fn pipeline_run_produces_result_files_for_every_bug() {
        let dir = std::env::temp_dir().join(format!("bug_localize_pipeline_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let bug_dir = dir.join("bug1");
        std::fs::create_dir_all(&bug_dir).unwrap();
        std::fs::write(bug_dir.join("title.txt"), "term1 crash").unwrap();
        std::fs::write(bug_dir.join("description.txt"), "shared failure term0").unwrap();

        let shared = build_shared(3);
        let output_root = dir.join("out");
        let pipeline = Pipeline {
            shared: Arc::new(Shared {
                corpus: shared.corpus.clone(),
                bm25_index: shared.bm25_index.clone(),
                dense_index: shared.dense_index.clone(),
                config: shared.config.clone(),
                stopwords: shared.stopwords.clone(),
                embedder: shared.embedder.clone(),
                keyword_extractor: shared.keyword_extractor.clone(),
                reasoner: shared.reasoner.clone(),
                log: shared.log.clone(),
                output_root: output_root.clone(),
            }),
        };

        let report = pipeline.run(vec![("bug1".to_string(), bug_dir)]).await;
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 0);

        let basic_result = output_root.join("bug1").join("bug1_baseline_basic_query_result.txt");
        assert!(basic_result.exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
