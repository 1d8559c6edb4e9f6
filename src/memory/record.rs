//! Memory record types
//!
//! A [`MemoryRecord`] is one remembered query/result pair. Records are
//! created by the orchestrator after a query completes, re-scored by later
//! relevance feedback, and destroyed by store-owned expiry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One remembered query/result pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Opaque id, generated on insert, immutable
    pub id: Uuid,

    /// The original query text
    pub query_text: String,

    /// Fixed-dimension embedding of the query
    pub embedding: Vec<f32>,

    /// Bounded structured payload describing the outcome
    pub result_summary: ResultDigest,

    /// Relevance in [0, 1]; mutable post-hoc via feedback
    pub relevance_score: f32,

    /// Sources used to produce the result, in invocation order
    pub source_ids: Vec<String>,

    /// Insert timestamp
    pub created_at: DateTime<Utc>,

    /// Optional grouping key
    pub session_id: Option<String>,
}

impl MemoryRecord {
    /// Rough in-memory footprint, used for store metrics
    pub fn approx_size_bytes(&self) -> usize {
        self.query_text.len()
            + self.embedding.len() * std::mem::size_of::<f32>()
            + self.result_summary.answer.len()
            + self
                .result_summary
                .refinement
                .as_ref()
                .map(|r| {
                    r.refinements.iter().map(String::len).sum::<usize>()
                        + r.prioritized_sources_used.iter().map(String::len).sum::<usize>()
                })
                .unwrap_or(0)
            + self.source_ids.iter().map(String::len).sum::<usize>()
            + self.session_id.as_ref().map(String::len).unwrap_or(0)
            + 64
    }
}

/// Bounded summary of a completed query, stored inside the record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultDigest {
    /// Synthesized answer text, truncated to the configured bound
    pub answer: String,

    /// Number of sources that returned a successful payload
    pub source_count: usize,

    /// Learning metadata attached when a refinement was produced
    pub refinement: Option<RefinementMeta>,
}

/// Refinement metadata carried on a record; this is what the feedback
/// builder later pairs with observed relevance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementMeta {
    /// Whether the refinement passed the acceptance threshold and was used
    pub applied: bool,

    /// Predicted confidence of the refinement at query time
    pub confidence: f32,

    /// Free-text refinement suggestions produced for the query
    pub refinements: Vec<String>,

    /// Ranked sources that were both prioritized and actually invoked
    pub prioritized_sources_used: Vec<String>,
}

/// Insert parameters; id and timestamps are assigned by the store
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub query_text: String,
    pub embedding: Vec<f32>,
    pub result_summary: ResultDigest,
    pub relevance_score: f32,
    pub source_ids: Vec<String>,
    pub session_id: Option<String>,
}

/// A record paired with its similarity to a query embedding
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub record: MemoryRecord,
    pub similarity: f32,
}

/// Aggregate store statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryMetrics {
    pub total_records: usize,
    pub avg_relevance: f32,
    pub high_quality_count: usize,
    pub approx_size_bytes: usize,
}
