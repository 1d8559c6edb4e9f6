//! History-driven query refinement
//!
//! Turns a query plus its most similar past records into a
//! confidence-scored [`RefinementResult`]: free-text suggestions from the
//! reasoning oracle and a ranked list of sources to prefer. Refinement is
//! an optimization, never a blocking dependency — any failure in the
//! pipeline degrades to the neutral result.

use super::parse::parse_oracle_response;
use super::HIGH_QUALITY_THRESHOLD;
use crate::memory::ScoredRecord;
use crate::oracle::ReasoningOracle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// How many prioritized sources a refinement carries at most
const MAX_PRIORITIZED_SOURCES: usize = 5;

const SYSTEM_PROMPT: &str = "You refine search queries using evidence from past successful \
queries. Respond with a JSON object: {\"refinements\": [\"...\"], \"rationale\": \"...\"}. \
Suggest at most five short, concrete refinements.";

/// Output of the refiner for one query; ephemeral, attached to the final
/// outcome for audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementResult {
    pub original_query: String,
    pub suggested_refinements: Vec<String>,
    /// Confidence in [0, 1] that the refinement will help
    pub confidence: f32,
    /// Most-preferred source first
    pub prioritized_source_ids: Vec<String>,
    pub rationale: String,
}

impl RefinementResult {
    /// The neutral result: no suggestions, no priorities, midpoint
    /// confidence. Returned when history offers nothing usable.
    pub fn neutral(query: &str) -> Self {
        Self {
            original_query: query.to_string(),
            suggested_refinements: Vec::new(),
            confidence: 0.5,
            prioritized_source_ids: Vec::new(),
            rationale: "no successful past patterns".to_string(),
        }
    }
}

/// Refines queries from retrieved history via the reasoning oracle
pub struct QueryRefiner {
    oracle: Arc<dyn ReasoningOracle>,
    temperature: f32,
}

impl QueryRefiner {
    /// Create a refiner over the given oracle
    pub fn new(oracle: Arc<dyn ReasoningOracle>, temperature: f32) -> Self {
        Self { oracle, temperature }
    }

    /// Refine a query against its most similar past records.
    ///
    /// Only records at or above the high-quality threshold count as
    /// successful patterns; with none, or on any oracle failure, the
    /// neutral result comes back instead of an error.
    pub async fn refine(&self, query: &str, similar: &[ScoredRecord]) -> RefinementResult {
        let patterns: Vec<&ScoredRecord> = similar
            .iter()
            .filter(|s| s.record.relevance_score >= HIGH_QUALITY_THRESHOLD)
            .collect();

        if patterns.is_empty() {
            return RefinementResult::neutral(query);
        }

        let prioritized_source_ids = prioritized_sources(&patterns);
        let confidence = refinement_confidence(&patterns);

        let prompt = build_prompt(query, &patterns);
        let raw = match self
            .oracle
            .complete(&prompt, SYSTEM_PROMPT, self.temperature)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Refinement oracle failed, using neutral result: {}", e);
                return RefinementResult::neutral(query);
            }
        };

        // An unparseable response still yields the learned priorities; only
        // the free-text suggestions are lost
        let (suggested_refinements, rationale) = match parse_oracle_response(&raw) {
            Some(parsed) => (
                parsed.refinements,
                parsed
                    .rationale
                    .unwrap_or_else(|| "derived from successful past patterns".to_string()),
            ),
            None => {
                tracing::debug!("Oracle refinement response had no parseable suggestions");
                (
                    Vec::new(),
                    "derived from successful past patterns".to_string(),
                )
            }
        };

        RefinementResult {
            original_query: query.to_string(),
            suggested_refinements,
            confidence,
            prioritized_source_ids,
            rationale,
        }
    }
}

/// Average each source's relevance across the patterns it appears in,
/// sort descending, take the top five. Equal means break by source id so
/// the ordering is deterministic.
fn prioritized_sources(patterns: &[&ScoredRecord]) -> Vec<String> {
    let mut sums: HashMap<&str, (f32, u32)> = HashMap::new();
    for pattern in patterns {
        for source_id in &pattern.record.source_ids {
            let entry = sums.entry(source_id.as_str()).or_insert((0.0, 0));
            entry.0 += pattern.record.relevance_score;
            entry.1 += 1;
        }
    }

    let mut averaged: Vec<(String, f32)> = sums
        .into_iter()
        .map(|(source_id, (sum, count))| (source_id.to_string(), sum / count as f32))
        .collect();
    averaged.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    averaged.truncate(MAX_PRIORITIZED_SOURCES);
    averaged.into_iter().map(|(source_id, _)| source_id).collect()
}

/// Blend match quality with match count so a single near-duplicate cannot
/// produce false high confidence:
/// `0.5·avg_relevance + 0.3·avg_similarity + 0.2·min(count/5, 1)`
fn refinement_confidence(patterns: &[&ScoredRecord]) -> f32 {
    let count = patterns.len() as f32;
    let avg_relevance = patterns.iter().map(|p| p.record.relevance_score).sum::<f32>() / count;
    let avg_similarity = patterns.iter().map(|p| p.similarity).sum::<f32>() / count;
    let pattern_confidence = (count / 5.0).min(1.0);

    (0.5 * avg_relevance + 0.3 * avg_similarity + 0.2 * pattern_confidence).clamp(0.0, 1.0)
}

fn build_prompt(query: &str, patterns: &[&ScoredRecord]) -> String {
    let mut prompt = format!("Query: {query}\n\nSuccessful past queries:\n");
    for pattern in patterns {
        prompt.push_str(&format!(
            "- \"{}\" (relevance {:.2}, similarity {:.2}, sources: {})\n",
            pattern.record.query_text,
            pattern.record.relevance_score,
            pattern.similarity,
            pattern.record.source_ids.join(", "),
        ));
    }
    prompt.push_str("\nSuggest refinements for the query based on these patterns.");
    prompt
}
