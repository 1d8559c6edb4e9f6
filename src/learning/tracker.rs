//! Per-source performance tracking
//!
//! Folds a recent window of memory records into per-source usage and
//! success statistics, blended into a single priority score. Results are
//! cached per lookback size; the cache is invalidated only by TTL expiry,
//! never explicitly, so staleness is bounded by the configured TTL.

use super::HIGH_QUALITY_THRESHOLD;
use crate::memory::MemoryStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Derived statistics for one source over the analysis window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetric {
    pub source_id: String,
    pub total_uses: u32,
    /// Fraction of uses whose record reached the high-quality threshold
    pub success_rate: f32,
    pub avg_relevance: f32,
    /// Blended ranking score, see [`SourceMetric::priority_score`] weights
    pub priority_score: f32,
}

struct CachedAnalysis {
    computed_at: Instant,
    metrics: Arc<HashMap<String, SourceMetric>>,
}

/// Aggregates recent memory records into source priority scores
pub struct SourcePerformanceTracker {
    store: Arc<MemoryStore>,
    cache_ttl: Duration,
    cache: RwLock<HashMap<usize, CachedAnalysis>>,
}

impl SourcePerformanceTracker {
    /// Create a tracker over the given store with the given cache TTL
    pub fn new(store: Arc<MemoryStore>, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache_ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Analyze the `lookback` most recent records into per-source metrics.
    ///
    /// With `use_cache`, a previous analysis for the same lookback is reused
    /// until the cache TTL lapses — callers may observe results up to one
    /// TTL stale. Concurrent refreshes are benign: last write wins.
    pub async fn analyze(
        &self,
        lookback: usize,
        use_cache: bool,
    ) -> Arc<HashMap<String, SourceMetric>> {
        if use_cache {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&lookback) {
                if cached.computed_at.elapsed() < self.cache_ttl {
                    return cached.metrics.clone();
                }
            }
        }

        let records = self.store.get_recent(lookback, 0.0).await;

        struct Accumulator {
            total: u32,
            high: u32,
            relevance_sum: f32,
        }
        let mut folded: HashMap<String, Accumulator> = HashMap::new();

        for record in &records {
            for source_id in &record.source_ids {
                let acc = folded.entry(source_id.clone()).or_insert(Accumulator {
                    total: 0,
                    high: 0,
                    relevance_sum: 0.0,
                });
                acc.total += 1;
                acc.relevance_sum += record.relevance_score;
                if record.relevance_score >= HIGH_QUALITY_THRESHOLD {
                    acc.high += 1;
                }
            }
        }

        let metrics: HashMap<String, SourceMetric> = folded
            .into_iter()
            .map(|(source_id, acc)| {
                let success_rate = acc.high as f32 / acc.total as f32;
                let avg_relevance = acc.relevance_sum / acc.total as f32;
                // The usage term discounts low-sample sources without ever
                // zeroing them out: one lucky hit cannot outrank a source
                // with consistent heavy use
                let usage_confidence = (acc.total as f32 / 10.0).min(1.0);
                let priority_score =
                    0.5 * success_rate + 0.3 * avg_relevance + 0.2 * usage_confidence;
                (
                    source_id.clone(),
                    SourceMetric {
                        source_id,
                        total_uses: acc.total,
                        success_rate,
                        avg_relevance,
                        priority_score,
                    },
                )
            })
            .collect();

        let metrics = Arc::new(metrics);
        tracing::debug!(
            lookback,
            sources = metrics.len(),
            records = records.len(),
            "Source performance analyzed"
        );

        self.cache.write().await.insert(
            lookback,
            CachedAnalysis {
                computed_at: Instant::now(),
                metrics: metrics.clone(),
            },
        );

        metrics
    }
}
