//! Information sources: candidates, ranking, and concurrent fan-out

pub mod fanout;
pub mod ranking;

pub use fanout::FanOutExecutor;
pub use ranking::{boost_factor, dedupe_candidates, rank_candidates};

use serde::{Deserialize, Serialize};

/// A catalog entry describing one invocable information source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCandidate {
    /// Stable identifier used for ranking and memory
    pub source_id: String,

    /// Human-readable name
    pub display_name: String,

    /// Opaque reference the invoker resolves to an endpoint
    pub endpoint_ref: String,

    /// Whether the catalog has verified this source
    pub verified: bool,

    /// Catalog-assigned priority before learned boosts
    pub baseline_priority: f32,
}

/// The result of invoking one source, success or typed failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationOutcome {
    pub source_id: String,
    pub succeeded: bool,
    pub payload: Option<serde_json::Value>,
    pub error_detail: Option<String>,
    pub elapsed_ms: u64,
}

impl InvocationOutcome {
    /// A successful outcome carrying a payload
    pub fn success(source_id: impl Into<String>, payload: serde_json::Value, elapsed_ms: u64) -> Self {
        Self {
            source_id: source_id.into(),
            succeeded: true,
            payload: Some(payload),
            error_detail: None,
            elapsed_ms,
        }
    }

    /// A failed outcome carrying the error detail
    pub fn failure(source_id: impl Into<String>, detail: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            source_id: source_id.into(),
            succeeded: false,
            payload: None,
            error_detail: Some(detail.into()),
            elapsed_ms,
        }
    }
}
