//! Vector-addressed memory store
//!
//! [`MemoryStore`] wraps a [`MemoryBackend`] and owns the invariants the
//! backend cannot: embedding dimension validation, relevance range checks,
//! summary truncation, and the retention TTL. Retrieval is best-effort — a
//! failing backend degrades reads to empty results instead of propagating,
//! so memory is never a hard dependency for answering a query.

use super::backend::{MemoryBackend, SearchFilter};
use super::record::{MemoryMetrics, MemoryRecord, NewRecord, ScoredRecord};
use crate::config::MemoryConfig;
use crate::error::{Error, Result};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Durable, TTL-bound store of [`MemoryRecord`]s with k-NN retrieval
pub struct MemoryStore {
    backend: Arc<dyn MemoryBackend>,
    dimension: usize,
    retention: Duration,
    max_summary_chars: usize,
}

impl MemoryStore {
    /// Create a store over the given backend
    pub fn new(backend: Arc<dyn MemoryBackend>, config: &MemoryConfig) -> Self {
        Self {
            backend,
            dimension: config.dimension,
            retention: Duration::seconds(config.retention_secs as i64),
            max_summary_chars: config.max_summary_chars,
        }
    }

    /// Create a store over a fresh [`super::InMemoryBackend`]
    pub fn in_memory(config: &MemoryConfig) -> Self {
        Self::new(Arc::new(super::InMemoryBackend::new()), config)
    }

    /// The fixed embedding dimension this store accepts
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }

    fn check_score(score: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&score) || score.is_nan() {
            return Err(Error::InvalidScore(score));
        }
        Ok(())
    }

    /// Insert a new record, returning its generated id.
    ///
    /// Fails with [`Error::DimensionMismatch`] on a wrong-length embedding
    /// and [`Error::InvalidScore`] on an out-of-range relevance. The answer
    /// text is truncated to the configured bound and source ids are
    /// deduplicated preserving first occurrence.
    pub async fn insert(&self, new: NewRecord) -> Result<Uuid> {
        self.check_dimension(&new.embedding)?;
        Self::check_score(new.relevance_score)?;

        let mut summary = new.result_summary;
        summary.answer = truncate_chars(&summary.answer, self.max_summary_chars);

        let mut seen = std::collections::HashSet::new();
        let source_ids: Vec<String> = new
            .source_ids
            .into_iter()
            .filter(|s| seen.insert(s.clone()))
            .collect();

        let record = MemoryRecord {
            id: Uuid::new_v4(),
            query_text: new.query_text,
            embedding: new.embedding,
            result_summary: summary,
            relevance_score: new.relevance_score,
            source_ids,
            created_at: Utc::now(),
            session_id: new.session_id,
        };
        let id = record.id;

        self.backend.insert(record, Utc::now() + self.retention).await?;
        tracing::debug!(record_id = %id, "Memory record stored");
        Ok(id)
    }

    /// Find the `top_k` most similar live records.
    ///
    /// The relevance floor and session scope narrow the candidate set before
    /// the k cutoff. Similarity is cosine; ties break by recency. A backend
    /// failure returns an empty list — retrieval never blocks a query. Only
    /// a wrong-dimension query embedding is a hard error.
    pub async fn find_similar(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_relevance: f32,
        session_id: Option<&str>,
    ) -> Result<Vec<ScoredRecord>> {
        self.check_dimension(embedding)?;

        let filter = SearchFilter {
            min_relevance,
            session_id: session_id.map(String::from),
        };
        match self.backend.search(embedding, top_k, &filter).await {
            Ok(results) => Ok(results),
            Err(e) => {
                tracing::warn!("Memory search failed, returning no matches: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Apply relevance feedback to a record.
    ///
    /// Fails with [`Error::InvalidScore`] outside [0, 1]. Returns whether
    /// the id existed. A successful update refreshes the record's TTL so
    /// recently-confirmed-useful memories outlive idle ones.
    pub async fn update_relevance(&self, id: &Uuid, new_score: f32) -> Result<bool> {
        Self::check_score(new_score)?;
        let existed = self
            .backend
            .update_relevance(id, new_score, Utc::now() + self.retention)
            .await?;
        if existed {
            tracing::debug!(record_id = %id, score = new_score, "Relevance updated");
        }
        Ok(existed)
    }

    /// Point lookup; best-effort like the other reads
    pub async fn get(&self, id: &Uuid) -> Option<MemoryRecord> {
        match self.backend.get(id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(record_id = %id, "Memory lookup failed: {}", e);
                None
            }
        }
    }

    /// The most recent live records, relevance floor applied.
    /// A backend failure degrades to an empty list.
    pub async fn get_recent(&self, limit: usize, min_relevance: f32) -> Vec<MemoryRecord> {
        match self.backend.recent(limit, min_relevance).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Recent-record scan failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Aggregate statistics over live records
    pub async fn metrics(&self) -> Result<MemoryMetrics> {
        self.backend.metrics().await
    }

    /// Drop expired records, returning how many were removed
    pub async fn sweep_expired(&self) -> Result<usize> {
        self.backend.sweep_expired().await
    }
}

/// Truncate a string to at most `max_chars` characters on a char boundary
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
