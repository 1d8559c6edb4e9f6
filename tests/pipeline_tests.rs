//! End-to-end pipeline tests over the public API, with scripted oracles
//! standing in for the external endpoints.

use async_trait::async_trait;
use hindsight::config::MemoryConfig;
use hindsight::embedding::HashedEmbedding;
use hindsight::error::{Error, Result};
use hindsight::memory::{MemoryStore, NewRecord, RefinementMeta, ResultDigest};
use hindsight::oracle::{ReasoningOracle, SourceCatalog, SourceInvoker};
use hindsight::sources::SourceCandidate;
use hindsight::{HindsightConfig, LearningOrchestrator, QueryRequest};
use std::sync::Arc;
use std::time::Duration;

const DIMENSION: usize = 64;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("hindsight=debug")
        .with_test_writer()
        .try_init();
}

/// Oracle that answers refinement prompts with canned JSON and synthesis
/// prompts with a fixed answer
struct ScriptedOracle;

#[async_trait]
impl ReasoningOracle for ScriptedOracle {
    async fn complete(&self, _prompt: &str, system_prompt: &str, _temperature: f32) -> Result<String> {
        if system_prompt.contains("refine") {
            Ok(r#"{ "refinements": ["add a time range"], "rationale": "seen before" }"#.to_string())
        } else {
            Ok("combined answer".to_string())
        }
    }
}

struct ScriptedCatalog(Vec<SourceCandidate>);

#[async_trait]
impl SourceCatalog for ScriptedCatalog {
    async fn discover(&self, _: &str, verified_only: bool, max: usize) -> Result<Vec<SourceCandidate>> {
        Ok(self
            .0
            .iter()
            .filter(|c| !verified_only || c.verified)
            .take(max)
            .cloned()
            .collect())
    }
}

/// Invoker scripted by source id: `fail-*` errors, `slow-*` hangs well past
/// any test deadline, everything else succeeds immediately
struct ScriptedInvoker;

#[async_trait]
impl SourceInvoker for ScriptedInvoker {
    async fn invoke(
        &self,
        source_id: &str,
        _endpoint_ref: &str,
        query: &str,
        _timeout: Duration,
    ) -> Result<serde_json::Value> {
        if source_id.starts_with("fail-") {
            return Err(Error::Oracle("upstream rejected the call".to_string()));
        }
        if source_id.starts_with("slow-") {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        Ok(serde_json::json!({ "source": source_id, "query": query }))
    }
}

fn candidate(id: &str, priority: f32) -> SourceCandidate {
    SourceCandidate {
        source_id: id.to_string(),
        display_name: id.to_string(),
        endpoint_ref: format!("ref-{id}"),
        verified: true,
        baseline_priority: priority,
    }
}

fn build(candidates: Vec<SourceCandidate>) -> (LearningOrchestrator, Arc<MemoryStore>) {
    let mut config = HindsightConfig::default();
    config.memory = MemoryConfig {
        dimension: DIMENSION,
        retention_secs: 3600,
        max_summary_chars: 1024,
    };
    let store = Arc::new(MemoryStore::in_memory(&config.memory));
    let orchestrator = LearningOrchestrator::new(
        config,
        store.clone(),
        Arc::new(HashedEmbedding::new(DIMENSION)),
        Arc::new(ScriptedOracle),
        Arc::new(ScriptedCatalog(candidates)),
        Arc::new(ScriptedInvoker),
    );
    (orchestrator, store)
}

#[tokio::test]
async fn test_second_identical_query_learns_from_first() {
    init_tracing();
    let (orchestrator, store) = build(vec![candidate("arxiv", 0.9), candidate("wiki", 0.7)]);

    let first = orchestrator
        .answer(QueryRequest::new("latest AI trends"))
        .await;
    assert!((first.refinement.confidence - 0.5).abs() < f32::EPSILON);
    assert!(first.refinement.prioritized_source_ids.is_empty());
    assert_eq!(first.answer.as_deref(), Some("combined answer"));
    let record = store.get(&first.memory_id.unwrap()).await.unwrap();
    assert_eq!(record.result_summary.source_count, 2);

    let second = orchestrator
        .answer(QueryRequest::new("latest AI trends"))
        .await;
    assert!(second.refinement.confidence > 0.5);
    assert!(!second.refinement.prioritized_source_ids.is_empty());
    assert_eq!(second.refinement.suggested_refinements, vec!["add a time range"]);

    // The second record's audit metadata reflects the applied refinement
    let record = store.get(&second.memory_id.unwrap()).await.unwrap();
    let meta = record.result_summary.refinement.unwrap();
    assert!(meta.applied);
    assert!(!meta.prioritized_sources_used.is_empty());
}

#[tokio::test]
async fn test_partial_failure_keeps_order_and_detail() {
    init_tracing();
    let (orchestrator, store) = build(vec![
        candidate("arxiv", 0.9),
        candidate("fail-blog", 0.8),
        candidate("wiki", 0.7),
    ]);

    let outcome = orchestrator
        .answer(QueryRequest::new("latest AI trends"))
        .await;

    let ids: Vec<&str> = outcome.outcomes.iter().map(|o| o.source_id.as_str()).collect();
    assert_eq!(ids, vec!["arxiv", "fail-blog", "wiki"]);
    assert!(outcome.outcomes[0].succeeded);
    assert!(!outcome.outcomes[1].succeeded);
    assert!(outcome.outcomes[1].error_detail.as_ref().unwrap().contains("rejected"));
    assert!(outcome.outcomes[2].succeeded);

    // Only successes count toward the stored digest
    let record = store.get(&outcome.memory_id.unwrap()).await.unwrap();
    assert_eq!(record.result_summary.source_count, 2);
    assert_eq!(outcome.answer.as_deref(), Some("combined answer"));
}

#[tokio::test]
async fn test_shared_deadline_discards_whole_batch() {
    init_tracing();
    let (orchestrator, store) = build(vec![candidate("arxiv", 0.9), candidate("slow-mirror", 0.8)]);

    let outcome = orchestrator
        .answer(QueryRequest::new("latest AI trends").timeout(Duration::from_millis(100)))
        .await;

    // Fail-closed: the fast source's completed result is discarded too
    assert!(outcome.outcomes.is_empty());
    assert!(outcome.answer.is_none());

    // The query is still remembered, with nothing gathered
    let record = store.get(&outcome.memory_id.unwrap()).await.unwrap();
    assert_eq!(record.result_summary.source_count, 0);
}

#[tokio::test]
async fn test_unverified_sources_filtered_by_catalog() {
    init_tracing();
    let mut unverified = candidate("shady", 1.0);
    unverified.verified = false;
    let (orchestrator, _) = build(vec![unverified, candidate("wiki", 0.7)]);

    let outcome = orchestrator
        .answer(QueryRequest::new("latest AI trends"))
        .await;
    let ids: Vec<&str> = outcome.ranked_sources.iter().map(|c| c.source_id.as_str()).collect();
    assert_eq!(ids, vec!["wiki"]);
}

#[tokio::test]
async fn test_max_sources_override_truncates_fanout() {
    init_tracing();
    let (orchestrator, _) = build(vec![
        candidate("a", 0.9),
        candidate("b", 0.8),
        candidate("c", 0.7),
    ]);

    let outcome = orchestrator
        .answer(QueryRequest::new("latest AI trends").max_sources(2))
        .await;
    assert_eq!(outcome.outcomes.len(), 2);
    let ids: Vec<&str> = outcome.outcomes.iter().map(|o| o.source_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn test_negative_feedback_suppresses_learned_patterns() {
    init_tracing();
    let (orchestrator, _) = build(vec![candidate("wiki", 0.7)]);

    let first = orchestrator
        .answer(QueryRequest::new("latest AI trends"))
        .await;
    assert!(orchestrator
        .record_feedback(&first.memory_id.unwrap(), 0.2)
        .await
        .unwrap());

    // The downgraded record no longer qualifies as a successful pattern
    let second = orchestrator
        .answer(QueryRequest::new("latest AI trends"))
        .await;
    assert!((second.refinement.confidence - 0.5).abs() < f32::EPSILON);
    assert!(second.refinement.prioritized_source_ids.is_empty());
}

#[tokio::test]
async fn test_threshold_adapts_to_overconfident_history() {
    init_tracing();
    let (orchestrator, store) = build(vec![candidate("wiki", 0.7)]);
    let embedder = HashedEmbedding::new(DIMENSION);

    // Seed ten records whose refinements were confidently wrong
    for i in 0..10 {
        store
            .insert(NewRecord {
                query_text: format!("query {i}"),
                embedding: embedder.vectorize(&format!("query {i}")),
                result_summary: ResultDigest {
                    answer: "stale".to_string(),
                    source_count: 1,
                    refinement: Some(RefinementMeta {
                        applied: true,
                        confidence: 0.9,
                        refinements: vec![],
                        prioritized_sources_used: vec!["wiki".to_string()],
                    }),
                },
                relevance_score: 0.1,
                source_ids: vec!["wiki".to_string()],
                session_id: None,
            })
            .await
            .unwrap();
    }

    let before = orchestrator.confidence_threshold().await;
    let after = orchestrator.adapt_threshold().await;
    assert!((before - 0.6).abs() < f32::EPSILON);
    assert!((after - 0.65).abs() < 0.001);
}

#[tokio::test]
async fn test_source_performance_over_accumulated_history() {
    init_tracing();
    let (orchestrator, _) = build(vec![candidate("arxiv", 0.9), candidate("fail-blog", 0.8)]);

    for _ in 0..3 {
        orchestrator
            .answer(QueryRequest::new("latest AI trends"))
            .await;
    }

    let metrics = orchestrator.source_performance(false).await;
    let arxiv = metrics.get("arxiv").unwrap();
    assert_eq!(arxiv.total_uses, 3);
    // Every record was stored at the optimistic initial relevance
    assert!((arxiv.success_rate - 1.0).abs() < f32::EPSILON);

    let memory = orchestrator.memory_metrics().await.unwrap();
    assert_eq!(memory.total_records, 3);
}
