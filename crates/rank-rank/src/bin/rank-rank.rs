//! The `rank-rank` command line driver: build a corpus index, run the
//! hybrid bug-localization pipeline over a directory of bug reports, and
//! score the resulting ranked-result files against ground truth.
//!
//! The embedder, keyword extractor, and reasoner the pipeline calls out to
//! are spec-level interfaces in `bug_localize::collaborators`; no concrete
//! model implementation ships with the library. This binary supplies its
//! own minimal, fully-deterministic defaults (feature-hashed embeddings, a
//! whitespace keyword split, a no-op reasoner) so the pipeline has
//! something real to run end to end without a network call or a bundled
//! model.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use bug_localize::{BugLocalizeError, Config, Embedder, KeywordExtractor, Reasoner};
use rank_eval::{Evaluator, GroundTruth};

const DEFAULT_EMBEDDING_DIM: usize = 128;

/// Feature-hashed bag-of-tokens embedding: each token is hashed into one of
/// `dim` buckets and accumulated with a sign derived from a second hash, then
/// the vector is L2-normalized. A standard trick for getting a fixed-size
/// embedding out of unbounded vocabulary without training anything.
struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn hash_token(token: &str, seed: u64) -> u64 {
        let mut hash = 0xcbf29ce484222325u64 ^ seed;
        for byte in token.as_bytes() {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        hash
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, BugLocalizeError> {
        let mut vector = vec![0.0f32; self.dim];
        for token in text.split_whitespace() {
            let bucket = (Self::hash_token(token, 0) as usize) % self.dim;
            let sign = if Self::hash_token(token, 1) & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn model_id(&self) -> &str {
        "hashing-embedder-v1"
    }
}

/// Returns up to `k` whitespace-separated tokens from the (already
/// normalized) input text, longest first, as a cheap stand-in for a real
/// keyword-extraction model.
struct WhitespaceKeywordExtractor;

impl KeywordExtractor for WhitespaceKeywordExtractor {
    fn extract(&self, text: &str, k: usize) -> Result<Vec<String>, BugLocalizeError> {
        let mut tokens: Vec<&str> = text.split_whitespace().collect();
        tokens.sort_by_key(|t| std::cmp::Reverse(t.len()));
        tokens.dedup();
        Ok(tokens.into_iter().take(k).map(|t| t.to_string()).collect())
    }
}

/// Declines to rewrite the query, matching the reasoner contract's "empty
/// string means no rewrite" best-effort policy.
struct PassthroughReasoner;

impl Reasoner for PassthroughReasoner {
    fn reason(&self, _raw_text: &str) -> Result<String, BugLocalizeError> {
        Ok(String::new())
    }
}

#[derive(Parser)]
#[command(author, version, about = "Hybrid BM25/dense bug-localization retrieval engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the corpus and report index statistics without running any bug reports.
    Index {
        /// Root directory of source files to index.
        #[arg(long)]
        corpus: PathBuf,
        /// Path to the TOML configuration file.
        #[arg(long)]
        config: PathBuf,
    },
    /// Run the pipeline over a directory of bug reports and write ranked-result files.
    Run {
        /// Path to the TOML configuration file.
        #[arg(long)]
        config: PathBuf,
        /// Root directory of source files to index.
        #[arg(long)]
        corpus: PathBuf,
        /// Root directory of bug reports (`<root>/<project>/<bug_id>/`).
        #[arg(long)]
        bug_reports: PathBuf,
        /// Directory to write ranked-result files under.
        #[arg(long)]
        output: PathBuf,
        /// Dimensionality of the default feature-hashed embedding.
        #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIM)]
        embedding_dim: usize,
    },
    /// Score ranked-result files under `--results` against a ground-truth file.
    Eval {
        /// Ground-truth file (spec.md §7 line format).
        #[arg(long)]
        ground_truth: PathBuf,
        /// Root directory of source files, used to check which ground-truth files exist.
        #[arg(long)]
        corpus: PathBuf,
        /// Directory of ranked-result files, as written by `run`.
        #[arg(long)]
        results: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run().await {
        eprintln!("error: {:#}", err);
        let exit_code = err
            .downcast_ref::<BugLocalizeError>()
            .map(bug_localize::exit_code)
            .unwrap_or(1);
        std::process::exit(exit_code);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Index { corpus, config } => cmd_index(&corpus, &config).await,
        Commands::Run { config, corpus, bug_reports, output, embedding_dim } => {
            cmd_run(&config, &corpus, &bug_reports, output, embedding_dim).await
        }
        Commands::Eval { ground_truth, corpus, results } => cmd_eval(&ground_truth, &corpus, &results),
    }
}

async fn cmd_index(corpus_root: &Path, config_path: &Path) -> Result<()> {
    let config = Config::load(config_path).map_err(anyhow_from_bug_localize)?;
    let stopwords = bug_localize::text::load_stopwords(&config.stopwords_path).map_err(anyhow_from_bug_localize)?;
    let extensions = config.corpus_extensions_set();
    let embedder = HashingEmbedder::new(DEFAULT_EMBEDDING_DIM);

    let (corpus, bm25_index, _dense_index) = bug_localize::index_cache::load_or_build_indexes(
        corpus_root,
        &extensions,
        &stopwords,
        &embedder,
        config.dense_metric,
        &config.index_cache_dir,
    )
    .map_err(anyhow_from_bug_localize)?;

    println!("indexed {} documents from {}", corpus.len(), corpus_root.display());
    println!("bm25_params: k1={} b={} docs={}", config.bm25_k1, config.bm25_b, bm25_index.num_docs());
    println!("dense_metric: {:?}", config.dense_metric);
    println!("index_cache_dir: {}", config.index_cache_dir.display());
    Ok(())
}

async fn cmd_run(
    config_path: &Path,
    corpus_root: &Path,
    bug_reports_root: &Path,
    output_root: PathBuf,
    embedding_dim: usize,
) -> Result<()> {
    let config = Config::load(config_path).map_err(anyhow_from_bug_localize)?;

    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(embedding_dim));
    let keyword_extractor: Arc<dyn KeywordExtractor> = Arc::new(WhitespaceKeywordExtractor);
    let reasoner: Arc<dyn Reasoner> = Arc::new(PassthroughReasoner);

    let report = rank_rank::pipeline::run_pipeline(
        config,
        corpus_root,
        bug_reports_root,
        output_root,
        embedder,
        keyword_extractor,
        reasoner,
    )
    .await
    .map_err(anyhow_from_bug_localize)?;

    println!("succeeded: {}  failed: {}", report.succeeded, report.failed);
    if report.failed > 0 {
        anyhow::bail!("{} bug report(s) failed localization; see logs for detail", report.failed);
    }
    Ok(())
}

const QUERY_FAMILIES: [&str; 3] = ["basic", "keybert", "reason"];

fn cmd_eval(ground_truth_path: &Path, corpus_root: &Path, results_root: &Path) -> Result<()> {
    let ground_truth = GroundTruth::load(ground_truth_path, corpus_root).context("loading ground truth")?;
    let existence = ground_truth.filter_existing(|file_id| corpus_root.join(file_id).exists());

    if !existence.bugs_all_missing.is_empty() {
        println!("{} bug(s) have no ground-truth files present in the corpus, excluded", existence.bugs_all_missing.len());
    }

    let evaluator = Evaluator::new(&existence.existing);

    for family in QUERY_FAMILIES {
        let mut results = std::collections::HashMap::new();
        for bug_id in existence.existing.keys() {
            for extent in ["baseline", "extended"] {
                let path = results_root.join(bug_id).join(format!("{}_{}_{}_query_result.txt", bug_id, extent, family));
                let ranked = rank_eval::load_ranked_result(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                results.insert((bug_id.clone(), extent.to_string()), ranked);
            }
        }

        let metrics = evaluator.evaluate(&results, "baseline", "extended");
        println!(
            "[{}] n={} baseline(hit@1={:.1} hit@5={:.1} hit@10={:.1} mrr={:.3} map={:.1}) extended(hit@1={:.1} hit@5={:.1} hit@10={:.1} mrr={:.3} map={:.1}) qe(improved={} identical={} worse={})",
            family,
            metrics.considered_bugs,
            metrics.baseline.hit_at_1,
            metrics.baseline.hit_at_5,
            metrics.baseline.hit_at_10,
            metrics.baseline.mrr,
            metrics.baseline.map,
            metrics.extended.hit_at_1,
            metrics.extended.hit_at_5,
            metrics.extended.hit_at_10,
            metrics.extended.mrr,
            metrics.extended.map,
            metrics.qe_stats.improved,
            metrics.qe_stats.identical,
            metrics.qe_stats.worse,
        );
    }

    Ok(())
}

fn anyhow_from_bug_localize(err: BugLocalizeError) -> anyhow::Error {
    anyhow::Error::new(err)
}
