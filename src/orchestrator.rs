//! Adaptive learning loop orchestration
//!
//! One [`LearningOrchestrator`] instance owns the per-query pipeline and
//! the mutable learning state:
//!
//! ```text
//! query ──> embed ──> find_similar ──> refine ──> rank sources ──> fan-out
//!                                                                    │
//!   next query benefits <── MemoryStore <── insert record <── synthesize
//! ```
//!
//! Every downstream failure is absorbed into a degraded-but-valid
//! [`QueryOutcome`]; the orchestrator never raises past input validation.

use crate::config::HindsightConfig;
use crate::embedding::{EmbeddingProvider, HashedEmbedding};
use crate::error::Result;
use crate::learning::{
    FeedbackSample, LearningState, QueryRefiner, RefinementResult, SourceMetric,
    SourcePerformanceTracker,
};
use crate::memory::{MemoryMetrics, MemoryStore, NewRecord, RefinementMeta, ResultDigest};
use crate::oracle::{ReasoningOracle, SourceCatalog, SourceInvoker};
use crate::sources::{
    dedupe_candidates, rank_candidates, FanOutExecutor, InvocationOutcome, SourceCandidate,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// How many similar records retrieval pulls per query
const SIMILAR_TOP_K: usize = 5;

/// Relevance floor applied to retrieval
const SIMILAR_MIN_RELEVANCE: f32 = 0.5;

/// Relevance assigned to a freshly stored record, before any feedback.
/// Sits at the high-quality threshold so a new outcome can immediately
/// serve as a successful pattern; feedback corrects it either way.
const INITIAL_RELEVANCE: f32 = 0.7;

const SYNTHESIS_PROMPT: &str = "You synthesize gathered source results into one concise, \
factual answer to the user's question. Cite source ids inline where useful.";

/// One incoming query with optional overrides
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub query: String,
    pub session_id: Option<String>,
    pub max_sources: Option<usize>,
    pub timeout: Option<Duration>,
}

impl QueryRequest {
    /// A request with defaults taken from the orchestrator's config
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            session_id: None,
            max_sources: None,
            timeout: None,
        }
    }

    /// Scope memory retrieval and the stored record to a session
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Override the configured maximum of invoked sources
    pub fn max_sources(mut self, max: usize) -> Self {
        self.max_sources = Some(max);
        self
    }

    /// Override the configured shared fan-out deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// The always-returned result of one pipeline run
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub query: String,
    /// Synthesized answer; `None` when no source returned a payload
    pub answer: Option<String>,
    pub refinement: RefinementResult,
    pub ranked_sources: Vec<SourceCandidate>,
    pub outcomes: Vec<InvocationOutcome>,
    /// Id of the record that closed the loop; `None` if the write failed
    pub memory_id: Option<Uuid>,
    pub elapsed_ms: u64,
}

/// Composes memory, learning, and fan-out into the per-query pipeline
pub struct LearningOrchestrator {
    config: HindsightConfig,
    store: Arc<MemoryStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    fallback_embedder: HashedEmbedding,
    oracle: Arc<dyn ReasoningOracle>,
    catalog: Arc<dyn SourceCatalog>,
    refiner: QueryRefiner,
    tracker: SourcePerformanceTracker,
    executor: FanOutExecutor,
    state: RwLock<LearningState>,
}

impl LearningOrchestrator {
    /// Wire an orchestrator from its collaborators
    pub fn new(
        config: HindsightConfig,
        store: Arc<MemoryStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        oracle: Arc<dyn ReasoningOracle>,
        catalog: Arc<dyn SourceCatalog>,
        invoker: Arc<dyn SourceInvoker>,
    ) -> Self {
        let fallback_embedder = HashedEmbedding::new(store.dimension());
        let refiner = QueryRefiner::new(oracle.clone(), config.oracle.temperature);
        let tracker = SourcePerformanceTracker::new(
            store.clone(),
            Duration::from_secs(config.learning.tracker_cache_ttl_secs),
        );
        let executor = FanOutExecutor::new(invoker);
        let state = RwLock::new(LearningState::new(
            config.learning.initial_threshold,
            config.learning.learning_rate,
        ));

        Self {
            config,
            store,
            embedder,
            fallback_embedder,
            oracle,
            catalog,
            refiner,
            tracker,
            executor,
            state,
        }
    }

    /// Run the full pipeline for one query.
    ///
    /// Always produces a [`QueryOutcome`] — possibly with no answer, no
    /// sources, and a neutral refinement, but never an error.
    pub async fn answer(&self, request: QueryRequest) -> QueryOutcome {
        let started = Instant::now();
        let query = request.query.clone();

        let embedding = self.embed(&query).await;

        let similar = match self
            .store
            .find_similar(
                &embedding,
                SIMILAR_TOP_K,
                SIMILAR_MIN_RELEVANCE,
                request.session_id.as_deref(),
            )
            .await
        {
            Ok(similar) => similar,
            Err(e) => {
                tracing::warn!("Similarity retrieval failed: {}", e);
                Vec::new()
            }
        };
        tracing::debug!(query = %query, matches = similar.len(), "Retrieved similar memories");

        let refinement = self.refiner.refine(&query, &similar).await;
        let threshold = self.state.read().await.confidence_threshold();
        let accepted = refinement.confidence >= threshold;

        let candidates = match self
            .catalog
            .discover(
                &query,
                self.config.fanout.verified_only,
                self.config.fanout.discover_limit,
            )
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!("Source discovery failed: {}", e);
                Vec::new()
            }
        };

        let prioritized: &[String] = if accepted {
            &refinement.prioritized_source_ids
        } else {
            &[]
        };
        let max_sources = request.max_sources.unwrap_or(self.config.fanout.max_sources);
        let ranked = rank_candidates(dedupe_candidates(candidates), prioritized, max_sources);

        let timeout = request
            .timeout
            .unwrap_or(Duration::from_secs(self.config.fanout.shared_timeout_secs));
        let outcomes = self.executor.gather(&ranked, &query, timeout).await;

        let answer = self.synthesize(&query, &outcomes).await;

        let invoked_ids: Vec<String> = ranked.iter().map(|c| c.source_id.clone()).collect();
        let prioritized_sources_used: Vec<String> = invoked_ids
            .iter()
            .filter(|id| refinement.prioritized_source_ids.contains(id))
            .cloned()
            .collect();
        let applied = accepted
            && (!refinement.suggested_refinements.is_empty()
                || !prioritized_sources_used.is_empty());

        let digest = ResultDigest {
            answer: answer.clone().unwrap_or_default(),
            source_count: outcomes.iter().filter(|o| o.succeeded).count(),
            refinement: Some(RefinementMeta {
                applied,
                confidence: refinement.confidence,
                refinements: refinement.suggested_refinements.clone(),
                prioritized_sources_used,
            }),
        };

        // This insert is what closes the loop: the next similar query's
        // retrieval will see this record
        let memory_id = match self
            .store
            .insert(NewRecord {
                query_text: query.clone(),
                embedding,
                result_summary: digest,
                relevance_score: INITIAL_RELEVANCE,
                source_ids: invoked_ids,
                session_id: request.session_id.clone(),
            })
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Failed to store memory record: {}", e);
                None
            }
        };

        QueryOutcome {
            query,
            answer,
            refinement,
            ranked_sources: ranked,
            outcomes,
            memory_id,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Apply external relevance feedback to a stored record.
    /// Returns whether the record existed.
    pub async fn record_feedback(&self, record_id: &Uuid, score: f32) -> Result<bool> {
        self.store.update_relevance(record_id, score).await
    }

    /// Build feedback samples from recent records carrying refinement
    /// metadata: predicted confidence at query time paired with the
    /// record's current (possibly corrected) relevance.
    pub async fn feedback_samples(&self, lookback: usize) -> Vec<FeedbackSample> {
        self.store
            .get_recent(lookback, 0.0)
            .await
            .into_iter()
            .filter_map(|record| {
                record.result_summary.refinement.as_ref().map(|meta| FeedbackSample {
                    source_query_id: record.id,
                    predicted_confidence: meta.confidence,
                    observed_relevance: record.relevance_score,
                    timestamp: record.created_at,
                })
            })
            .collect()
    }

    /// Retune the acceptance threshold from recent feedback, returning the
    /// new value
    pub async fn adapt_threshold(&self) -> f32 {
        let samples = self.feedback_samples(self.config.learning.lookback).await;
        self.state.write().await.adjust(&samples)
    }

    /// Current acceptance threshold
    pub async fn confidence_threshold(&self) -> f32 {
        self.state.read().await.confidence_threshold()
    }

    /// Per-source performance over the configured lookback window.
    /// Cached results may be up to the tracker TTL stale.
    pub async fn source_performance(&self, use_cache: bool) -> Arc<HashMap<String, SourceMetric>> {
        self.tracker
            .analyze(self.config.learning.lookback, use_cache)
            .await
    }

    /// Aggregate memory statistics
    pub async fn memory_metrics(&self) -> Result<MemoryMetrics> {
        self.store.metrics().await
    }

    /// Embed a query, falling back to the deterministic hash provider when
    /// the configured one fails or returns the wrong shape — the loop must
    /// still close on a degraded embedding path.
    async fn embed(&self, text: &str) -> Vec<f32> {
        match self.embedder.embed(text).await {
            Ok(v) if v.len() == self.store.dimension() => v,
            Ok(v) => {
                tracing::warn!(
                    expected = self.store.dimension(),
                    actual = v.len(),
                    "Embedding provider returned wrong dimension, using hashed fallback"
                );
                self.fallback_embedder.vectorize(text)
            }
            Err(e) => {
                tracing::warn!("Embedding provider failed, using hashed fallback: {}", e);
                self.fallback_embedder.vectorize(text)
            }
        }
    }

    /// Fold successful outcomes into a synthesized answer. Oracle failure
    /// degrades to a stitched summary; no successes means no answer.
    async fn synthesize(&self, query: &str, outcomes: &[InvocationOutcome]) -> Option<String> {
        let successes: Vec<&InvocationOutcome> =
            outcomes.iter().filter(|o| o.succeeded).collect();
        if successes.is_empty() {
            return None;
        }

        let mut prompt = format!("Question: {query}\n\nGathered results:\n");
        for outcome in &successes {
            let payload = outcome
                .payload
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_default();
            prompt.push_str(&format!(
                "[{}] {}\n",
                outcome.source_id,
                truncate_chars(&payload, 2000)
            ));
        }
        prompt.push_str("\nSynthesize one concise answer from these results.");

        match self
            .oracle
            .complete(&prompt, SYNTHESIS_PROMPT, self.config.oracle.temperature)
            .await
        {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Synthesis oracle failed, stitching raw summary: {}", e);
                let ids: Vec<&str> = successes.iter().map(|o| o.source_id.as_str()).collect();
                Some(format!(
                    "Gathered {} result(s) from: {}",
                    successes.len(),
                    ids.join(", ")
                ))
            }
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
