//! HTTP embedding client

use super::EmbeddingProvider;
use crate::config::OracleConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Embedding provider backed by a remote HTTP model endpoint
pub struct HttpEmbedding {
    client: reqwest::Client,
    url: String,
    dimension: usize,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl HttpEmbedding {
    /// Create a client for the configured embedding endpoint
    pub fn new(config: &OracleConfig, dimension: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.embedding_url.clone(),
            dimension,
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedding {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let payload = serde_json::json!({ "text": text });

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Oracle(format!("Embedding request failed: {}", e)))?;

        let result: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Oracle(format!("Failed to parse embedding response: {}", e)))?;

        if result.embedding.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: result.embedding.len(),
            });
        }

        Ok(result.embedding)
    }
}
