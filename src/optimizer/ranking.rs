use std::cmp::Ordering;
use std::collections::HashSet;

use crate::config::DedupMode;
use crate::optimizer::combination::Combination;

/// Tie-break chain: auto-adjusted first, then closest to the requirement,
/// then fewer stints, then better swap distribution (no score counts as 0).
pub fn compare_combinations(left: &Combination, right: &Combination) -> Ordering {
    right
        .is_auto_adjusted
        .cmp(&left.is_auto_adjusted)
        .then_with(|| left.over_time.abs().total_cmp(&right.over_time.abs()))
        .then_with(|| left.total_stints.cmp(&right.total_stints))
        .then_with(|| {
            let left_score = left.swap_optimization_score.unwrap_or(0.0);
            let right_score = right.swap_optimization_score.unwrap_or(0.0);
            right_score.total_cmp(&left_score)
        })
}

/// Stable sort by [compare_combinations]; equal rows keep their input order.
pub fn rank_combinations(mut combinations: Vec<Combination>) -> Vec<Combination> {
    combinations.sort_by(compare_combinations);
    combinations
}

/// Keep the first row per key, where the key is the plan-count signature or,
/// in [DedupMode::SwapVariant], the signature plus swap placement.
pub fn dedup_combinations(combinations: Vec<Combination>, mode: DedupMode) -> Vec<Combination> {
    let mut seen: HashSet<(String, Vec<u32>)> = HashSet::with_capacity(combinations.len());
    combinations
        .into_iter()
        .filter(|combo| {
            let placement = match mode {
                DedupMode::Signature => Vec::new(),
                DedupMode::SwapVariant => combo.swap_placement.clone(),
            };
            seen.insert((combo.signature.clone(), placement))
        })
        .collect()
}
