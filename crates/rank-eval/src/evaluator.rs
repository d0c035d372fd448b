//! Computing Hit@K / MRR / MAP and query-expansion accounting over a set of
//! ranked results, aligned against a ground truth restricted to existing
//! files.

use crate::binary::{average_precision, hit_at_k, reciprocal_rank};
use std::collections::{HashMap, HashSet};

/// Whether the extended-query variant improved, matched, or worsened the
/// first relevant rank relative to the baseline variant, for one bug.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QeStats {
    pub improved: usize,
    pub identical: usize,
    pub worse: usize,
}

/// Per-bug ranks of the first relevant result, kept for individual-result
/// reporting alongside the aggregate metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct BugRank {
    pub bug_id: String,
    /// 1-based rank of the first relevant result in the baseline ranking, if any.
    pub baseline_rank: Option<usize>,
    /// 1-based rank of the first relevant result in the extended ranking, if any.
    pub extended_rank: Option<usize>,
}

/// Aggregate Hit@{1,5,10}/MRR/MAP for one query variant (baseline or extended).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VariantScore {
    pub hit_at_1: f64,
    pub hit_at_5: f64,
    pub hit_at_10: f64,
    pub mrr: f64,
    pub map: f64,
}

/// Full evaluation result for a baseline/extended query-variant pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantMetrics {
    pub considered_bugs: usize,
    pub baseline: VariantScore,
    pub extended: VariantScore,
    pub qe_stats: QeStats,
    pub bug_ranks: Vec<BugRank>,
    /// Bugs with no remaining ground truth after existence filtering; excluded
    /// from every metric above.
    pub bugs_missing_ground_truth: Vec<String>,
}

/// Evaluates ranked results against an existence-filtered ground truth.
pub struct Evaluator<'a> {
    ground_truth: &'a HashMap<String, HashSet<String>>,
}

impl<'a> Evaluator<'a> {
    /// `ground_truth` should already be restricted to files that exist in
    /// the corpus (see [`crate::ground_truth::GroundTruth::filter_existing`]).
    pub fn new(ground_truth: &'a HashMap<String, HashSet<String>>) -> Self {
        Self { ground_truth }
    }

    /// Evaluate one variant pair. `results` maps `(bug_id, "baseline" |
    /// "extended")` to the ranked file-id list for that bug and variant; a
    /// bug/variant combination absent from `results` is treated as an empty
    /// ranking, matching the "missing result file" policy in spec.md §7.
    pub fn evaluate(
        &self,
        results: &HashMap<(String, String), Vec<String>>,
        baseline_variant: &str,
        extended_variant: &str,
    ) -> VariantMetrics {
        let empty: Vec<String> = Vec::new();

        let mut bug_ids: Vec<&String> = self.ground_truth.keys().collect();
        bug_ids.sort();

        let mut metrics = VariantMetrics::default();
        let mut hit1_b = 0usize;
        let mut hit5_b = 0usize;
        let mut hit10_b = 0usize;
        let mut hit1_e = 0usize;
        let mut hit5_e = 0usize;
        let mut hit10_e = 0usize;
        let mut mrr_b_sum = 0.0;
        let mut mrr_e_sum = 0.0;
        let mut map_b_sum = 0.0;
        let mut map_e_sum = 0.0;

        for bug_id in bug_ids {
            let relevant = match self.ground_truth.get(bug_id) {
                Some(set) if !set.is_empty() => set,
                _ => {
                    metrics.bugs_missing_ground_truth.push(bug_id.clone());
                    continue;
                }
            };

            let baseline = results
                .get(&(bug_id.clone(), baseline_variant.to_string()))
                .unwrap_or(&empty);
            let extended = results
                .get(&(bug_id.clone(), extended_variant.to_string()))
                .unwrap_or(&empty);

            let baseline_first_rank = baseline.iter().position(|id| relevant.contains(id)).map(|p| p + 1);
            let extended_first_rank = extended.iter().position(|id| relevant.contains(id)).map(|p| p + 1);

            match (baseline_first_rank, extended_first_rank) {
                (Some(b), Some(e)) if e < b => metrics.qe_stats.improved += 1,
                (None, Some(_)) => metrics.qe_stats.improved += 1,
                (Some(b), Some(e)) if e == b => metrics.qe_stats.identical += 1,
                (None, None) => metrics.qe_stats.identical += 1,
                _ => metrics.qe_stats.worse += 1,
            }

            metrics.bug_ranks.push(BugRank {
                bug_id: bug_id.clone(),
                baseline_rank: baseline_first_rank,
                extended_rank: extended_first_rank,
            });

            if hit_at_k(baseline, relevant, 1) {
                hit1_b += 1;
            }
            if hit_at_k(baseline, relevant, 5) {
                hit5_b += 1;
            }
            if hit_at_k(baseline, relevant, 10) {
                hit10_b += 1;
            }
            if hit_at_k(extended, relevant, 1) {
                hit1_e += 1;
            }
            if hit_at_k(extended, relevant, 5) {
                hit5_e += 1;
            }
            if hit_at_k(extended, relevant, 10) {
                hit10_e += 1;
            }

            mrr_b_sum += reciprocal_rank(baseline, relevant);
            mrr_e_sum += reciprocal_rank(extended, relevant);
            map_b_sum += average_precision(baseline, relevant);
            map_e_sum += average_precision(extended, relevant);

            metrics.considered_bugs += 1;
        }

        let n = metrics.considered_bugs;
        if n > 0 {
            let n = n as f64;
            metrics.baseline = VariantScore {
                hit_at_1: hit1_b as f64 / n * 100.0,
                hit_at_5: hit5_b as f64 / n * 100.0,
                hit_at_10: hit10_b as f64 / n * 100.0,
                mrr: mrr_b_sum / n,
                map: map_b_sum / n * 100.0,
            };
            metrics.extended = VariantScore {
                hit_at_1: hit1_e as f64 / n * 100.0,
                hit_at_5: hit5_e as f64 / n * 100.0,
                hit_at_10: hit10_e as f64 / n * 100.0,
                mrr: mrr_e_sum / n,
                map: map_e_sum / n * 100.0,
            };
        }

        metrics
    }
}
