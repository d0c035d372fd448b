//! Binary-relevance ranked-retrieval metrics.
//!
//! Every function here scores a single ranked list against a single relevance
//! set; `Evaluator` means these over the bugs it considers.

use std::collections::HashSet;

/// `true` iff any of the top `k` results is relevant. `k = 0` is always `false`.
pub fn hit_at_k(ranked: &[String], relevant: &HashSet<String>, k: usize) -> bool {
    ranked.iter().take(k).any(|id| relevant.contains(id))
}

/// Fraction of the top `k` results that are relevant.
pub fn precision_at_k(ranked: &[String], relevant: &HashSet<String>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let hits = ranked.iter().take(k).filter(|id| relevant.contains(*id)).count();
    hits as f64 / k as f64
}

/// Fraction of all relevant documents present in the top `k` results.
/// `0.0` if `relevant` is empty.
pub fn recall_at_k(ranked: &[String], relevant: &HashSet<String>, k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let hits = ranked.iter().take(k).filter(|id| relevant.contains(*id)).count();
    hits as f64 / relevant.len() as f64
}

/// `1 / rank` of the first relevant result (1-based), or `0.0` if none appears.
pub fn reciprocal_rank(ranked: &[String], relevant: &HashSet<String>) -> f64 {
    ranked
        .iter()
        .position(|id| relevant.contains(id))
        .map(|pos| 1.0 / (pos + 1) as f64)
        .unwrap_or(0.0)
}

/// Average Precision: mean of precision-at-i over every rank `i` where a
/// relevant document appears, divided by the number of relevant documents
/// retrieved. `0.0` if no relevant document was retrieved.
pub fn average_precision(ranked: &[String], relevant: &HashSet<String>) -> f64 {
    let mut hits = 0usize;
    let mut precision_sum = 0.0;
    for (i, id) in ranked.iter().enumerate() {
        if relevant.contains(id) {
            hits += 1;
            precision_sum += hits as f64 / (i + 1) as f64;
        }
    }
    if hits == 0 {
        0.0
    } else {
        precision_sum / hits as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn ranked(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn hit_at_k_true_when_relevant_in_window() {
        let r = ranked(&["a", "b", "c"]);
        let rel = set(&["c"]);
        assert!(!hit_at_k(&r, &rel, 1));
        assert!(hit_at_k(&r, &rel, 3));
    }

    #[test]
    fn precision_at_k_counts_relevant_fraction() {
        let r = ranked(&["a", "b", "c", "d"]);
        let rel = set(&["a", "c"]);
        assert!((precision_at_k(&r, &rel, 4) - 0.5).abs() < 1e-9);
        assert!((precision_at_k(&r, &rel, 2) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn recall_at_k_reaches_one_when_all_found() {
        let r = ranked(&["a", "b", "c"]);
        let rel = set(&["a", "b"]);
        assert!((recall_at_k(&r, &rel, 3) - 1.0).abs() < 1e-9);
        assert!((recall_at_k(&r, &rel, 1) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn recall_at_k_empty_relevant_is_zero() {
        let r = ranked(&["a"]);
        assert_eq!(recall_at_k(&r, &HashSet::new(), 1), 0.0);
    }

    #[test]
    fn reciprocal_rank_of_second_position_is_half() {
        let r = ranked(&["a", "b"]);
        let rel = set(&["b"]);
        assert!((reciprocal_rank(&r, &rel) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn reciprocal_rank_is_zero_when_absent() {
        let r = ranked(&["a", "b"]);
        let rel = set(&["z"]);
        assert_eq!(reciprocal_rank(&r, &rel), 0.0);
    }

    #[test]
    fn average_precision_matches_hand_computed_example() {
        // relevant at positions 1 and 3 (1-based): AP = (1/1 + 2/3) / 2
        let r = ranked(&["a", "b", "c", "d"]);
        let rel = set(&["a", "c"]);
        let expected = (1.0 / 1.0 + 2.0 / 3.0) / 2.0;
        assert!((average_precision(&r, &rel) - expected).abs() < 1e-9);
    }

    #[test]
    fn average_precision_is_zero_with_no_hits() {
        let r = ranked(&["a", "b"]);
        let rel = set(&["z"]);
        assert_eq!(average_precision(&r, &rel), 0.0);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn metrics_are_bounded(
            present in proptest::collection::vec(any::<bool>(), 1..20),
        ) {
            let ranked: Vec<String> = (0..present.len()).map(|i| i.to_string()).collect();
            let relevant: HashSet<String> = present
                .iter()
                .enumerate()
                .filter(|(_, &p)| p)
                .map(|(i, _)| i.to_string())
                .collect();

            let rr = reciprocal_rank(&ranked, &relevant);
            let ap = average_precision(&ranked, &relevant);
            let p = precision_at_k(&ranked, &relevant, ranked.len());
            let rec = recall_at_k(&ranked, &relevant, ranked.len());

            prop_assert!((0.0..=1.0).contains(&rr));
            prop_assert!((0.0..=1.0).contains(&ap));
            prop_assert!((0.0..=1.0).contains(&p));
            prop_assert!((0.0..=1.0).contains(&rec));
        }
    }
}
