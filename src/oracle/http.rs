//! HTTP clients for the external oracles

use super::{ReasoningOracle, SourceCatalog, SourceInvoker};
use crate::config::OracleConfig;
use crate::error::{Error, Result};
use crate::sources::SourceCandidate;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Text-completion client
pub struct HttpReasoningOracle {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    text: String,
}

impl HttpReasoningOracle {
    /// Create a client for the configured reasoning endpoint
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.reasoning_url.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

#[async_trait]
impl ReasoningOracle for HttpReasoningOracle {
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: &str,
        temperature: f32,
    ) -> Result<String> {
        let payload = serde_json::json!({
            "prompt": prompt,
            "system_prompt": system_prompt,
            "temperature": temperature,
        });

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Oracle(format!("Completion request failed: {}", e)))?;

        let result: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Oracle(format!("Failed to parse completion response: {}", e)))?;

        Ok(result.text)
    }
}

/// Source-catalog discovery client
pub struct HttpSourceCatalog {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct DiscoverResponse {
    sources: Vec<SourceCandidate>,
}

impl HttpSourceCatalog {
    /// Create a client for the configured catalog endpoint
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.catalog_url.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

#[async_trait]
impl SourceCatalog for HttpSourceCatalog {
    async fn discover(
        &self,
        search_term: &str,
        verified_only: bool,
        max_results: usize,
    ) -> Result<Vec<SourceCandidate>> {
        let payload = serde_json::json!({
            "search_term": search_term,
            "verified_only": verified_only,
            "max_results": max_results,
        });

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Oracle(format!("Discovery request failed: {}", e)))?;

        let result: DiscoverResponse = response
            .json()
            .await
            .map_err(|e| Error::Oracle(format!("Failed to parse discovery response: {}", e)))?;

        Ok(result.sources)
    }
}

/// Source invocation client
pub struct HttpSourceInvoker {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    success: bool,
    #[serde(default)]
    payload: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpSourceInvoker {
    /// Create a client for the configured invocation endpoint
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.invoke_url.clone(),
        }
    }
}

#[async_trait]
impl SourceInvoker for HttpSourceInvoker {
    async fn invoke(
        &self,
        source_id: &str,
        endpoint_ref: &str,
        query: &str,
        timeout: Duration,
    ) -> Result<serde_json::Value> {
        let payload = serde_json::json!({
            "source_id": source_id,
            "endpoint_ref": endpoint_ref,
            "query": query,
        });

        let response = self
            .client
            .post(&self.url)
            .timeout(timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Oracle(format!("Invocation request failed: {}", e)))?;

        let result: InvokeResponse = response
            .json()
            .await
            .map_err(|e| Error::Oracle(format!("Failed to parse invocation response: {}", e)))?;

        if !result.success {
            return Err(Error::Oracle(
                result
                    .error
                    .unwrap_or_else(|| format!("source {} reported failure", source_id)),
            ));
        }

        result
            .payload
            .ok_or_else(|| Error::Oracle(format!("source {} returned no payload", source_id)))
    }
}
