//! Memory persistence backends
//!
//! A [`MemoryBackend`] is any persistence layer offering TTL-bound records
//! plus k-NN vector search with scalar-field filtering. No index algorithm
//! is mandated; [`InMemoryBackend`] ships as the default, doing brute-force
//! cosine search over a `tokio::sync::RwLock` map with lazy expiry.

use super::record::{MemoryMetrics, MemoryRecord, ScoredRecord};
use super::similarity::cosine_similarity;
use crate::error::Result;
use crate::learning::HIGH_QUALITY_THRESHOLD;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Scalar filters applied before the k-NN cutoff
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Minimum relevance score a candidate must carry
    pub min_relevance: f32,

    /// Restrict candidates to one session
    pub session_id: Option<String>,
}

/// TTL-bound key-value storage with vector search
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// Persist a record with its expiry timestamp
    async fn insert(&self, record: MemoryRecord, expires_at: DateTime<Utc>) -> Result<()>;

    /// Point lookup; expired records are treated as absent
    async fn get(&self, id: &Uuid) -> Result<Option<MemoryRecord>>;

    /// Overwrite a record's relevance and push out its expiry.
    /// Returns whether the id existed (and was live).
    async fn update_relevance(
        &self,
        id: &Uuid,
        score: f32,
        expires_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Live records ordered by recency descending
    async fn recent(&self, limit: usize, min_relevance: f32) -> Result<Vec<MemoryRecord>>;

    /// k-NN search over embeddings. Filters narrow the candidate set before
    /// the top-k cutoff; ties in similarity break by recency.
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<ScoredRecord>>;

    /// Aggregate statistics over live records
    async fn metrics(&self) -> Result<MemoryMetrics>;

    /// Drop expired records, returning how many were removed
    async fn sweep_expired(&self) -> Result<usize>;
}

struct StoredRecord {
    record: MemoryRecord,
    expires_at: DateTime<Utc>,
}

impl StoredRecord {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// In-process backend over a `RwLock`-guarded map
pub struct InMemoryBackend {
    records: Arc<RwLock<HashMap<Uuid, StoredRecord>>>,
}

impl InMemoryBackend {
    /// Create a new empty backend
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryBackend for InMemoryBackend {
    async fn insert(&self, record: MemoryRecord, expires_at: DateTime<Utc>) -> Result<()> {
        let id = record.id;
        self.records
            .write()
            .await
            .insert(id, StoredRecord { record, expires_at });
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<Option<MemoryRecord>> {
        let now = Utc::now();
        Ok(self
            .records
            .read()
            .await
            .get(id)
            .filter(|s| s.is_live(now))
            .map(|s| s.record.clone()))
    }

    async fn update_relevance(
        &self,
        id: &Uuid,
        score: f32,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let now = Utc::now();
        let mut map = self.records.write().await;
        match map.get_mut(id) {
            Some(stored) if stored.is_live(now) => {
                stored.record.relevance_score = score;
                // Refresh, never shorten: keeps a racing sweep from
                // clipping a record that was just confirmed useful
                if expires_at > stored.expires_at {
                    stored.expires_at = expires_at;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn recent(&self, limit: usize, min_relevance: f32) -> Result<Vec<MemoryRecord>> {
        let now = Utc::now();
        let map = self.records.read().await;
        let mut live: Vec<MemoryRecord> = map
            .values()
            .filter(|s| s.is_live(now) && s.record.relevance_score >= min_relevance)
            .map(|s| s.record.clone())
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        live.truncate(limit);
        Ok(live)
    }

    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<ScoredRecord>> {
        let now = Utc::now();
        let map = self.records.read().await;

        let mut scored: Vec<ScoredRecord> = map
            .values()
            .filter(|s| s.is_live(now))
            .filter(|s| s.record.relevance_score >= filter.min_relevance)
            .filter(|s| match &filter.session_id {
                Some(session) => s.record.session_id.as_deref() == Some(session.as_str()),
                None => true,
            })
            .map(|s| ScoredRecord {
                similarity: cosine_similarity(embedding, &s.record.embedding),
                record: s.record.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.record.created_at.cmp(&a.record.created_at))
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn metrics(&self) -> Result<MemoryMetrics> {
        let now = Utc::now();
        let map = self.records.read().await;
        let live: Vec<&StoredRecord> = map.values().filter(|s| s.is_live(now)).collect();

        let total_records = live.len();
        let avg_relevance = if live.is_empty() {
            0.0
        } else {
            live.iter().map(|s| s.record.relevance_score).sum::<f32>() / live.len() as f32
        };
        let high_quality_count = live
            .iter()
            .filter(|s| s.record.relevance_score >= HIGH_QUALITY_THRESHOLD)
            .count();
        let approx_size_bytes = live.iter().map(|s| s.record.approx_size_bytes()).sum();

        Ok(MemoryMetrics {
            total_records,
            avg_relevance,
            high_quality_count,
            approx_size_bytes,
        })
    }

    async fn sweep_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let mut map = self.records.write().await;
        let before = map.len();
        map.retain(|_, s| s.is_live(now));
        Ok(before - map.len())
    }
}
