//! Candidate deduplication and learned-boost ranking
//!
//! The orchestrator runs this before a fan-out: dedupe by id (first
//! occurrence wins), multiply a positional boost into the baseline priority
//! of every candidate the refiner prioritized, sort descending, truncate.

use super::SourceCandidate;
use std::collections::HashSet;

/// Drop duplicate candidates by `source_id`, keeping first occurrence
pub fn dedupe_candidates(candidates: Vec<SourceCandidate>) -> Vec<SourceCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.source_id.clone()))
        .collect()
}

/// Multiplicative boost for a source at `rank_index` of a prioritized list
/// of `total` entries: rank 0 of 5 gets 1.5, rank 4 of 5 gets 1.1.
pub fn boost_factor(rank_index: usize, total: usize) -> f32 {
    if total == 0 {
        return 1.0;
    }
    1.0 + 0.5 * (1.0 - rank_index as f32 / total as f32)
}

/// Rank candidates by boosted priority and truncate to `max_count`.
///
/// Candidates present in `prioritized` have their baseline priority
/// multiplied by [`boost_factor`] at their prioritized rank; the rest keep
/// their baseline. Sort is descending and stable, so equal priorities keep
/// catalog order.
pub fn rank_candidates(
    candidates: Vec<SourceCandidate>,
    prioritized: &[String],
    max_count: usize,
) -> Vec<SourceCandidate> {
    let mut scored: Vec<(f32, SourceCandidate)> = candidates
        .into_iter()
        .map(|c| {
            let boost = prioritized
                .iter()
                .position(|p| p == &c.source_id)
                .map(|rank| boost_factor(rank, prioritized.len()))
                .unwrap_or(1.0);
            (c.baseline_priority * boost, c)
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(max_count);
    scored.into_iter().map(|(_, c)| c).collect()
}
