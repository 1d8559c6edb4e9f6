//! External oracle seams
//!
//! The core consumes, but does not implement, its reasoning and source
//! machinery: a text-completion oracle, a source catalog, and a source
//! invoker. All failures behind these traits are expected to be caught and
//! degraded by callers; none is a hard dependency for answering a query.

pub mod http;

pub use http::{HttpReasoningOracle, HttpSourceCatalog, HttpSourceInvoker};

use crate::error::Result;
use crate::sources::SourceCandidate;
use async_trait::async_trait;
use std::time::Duration;

/// Natural-language completion oracle used for refinement and synthesis
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    /// Complete a prompt, returning raw text. May take arbitrary latency up
    /// to the implementation's own budget; errors must be catchable.
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: &str,
        temperature: f32,
    ) -> Result<String>;
}

/// Discovery of invocable information sources
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Discover candidate sources for a search term. May return fewer than
    /// `max_results`, or none.
    async fn discover(
        &self,
        search_term: &str,
        verified_only: bool,
        max_results: usize,
    ) -> Result<Vec<SourceCandidate>>;
}

/// Invocation of one named source
#[async_trait]
pub trait SourceInvoker: Send + Sync {
    /// Invoke a source with the query, returning its raw payload. Must be
    /// safely callable concurrently across distinct sources.
    async fn invoke(
        &self,
        source_id: &str,
        endpoint_ref: &str,
        query: &str,
        timeout: Duration,
    ) -> Result<serde_json::Value>;
}
