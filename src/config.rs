//! Hindsight configuration management

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main Hindsight configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HindsightConfig {
    /// Memory store configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Learning engine configuration
    #[serde(default)]
    pub learning: LearningConfig,

    /// Fan-out executor configuration
    #[serde(default)]
    pub fanout: FanoutConfig,

    /// External oracle endpoints
    #[serde(default)]
    pub oracle: OracleConfig,
}

impl HindsightConfig {
    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }
}

/// Memory store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Fixed embedding dimension, validated on every insert and query
    pub dimension: usize,

    /// Retention window in seconds; records expire this long after their
    /// last write (insert or relevance update)
    pub retention_secs: u64,

    /// Maximum characters kept in a stored result summary
    pub max_summary_chars: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            dimension: 1024,
            // 30 days
            retention_secs: 30 * 24 * 3600,
            max_summary_chars: 4096,
        }
    }
}

/// Learning engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Starting confidence threshold, clamped to [0.3, 0.9]
    pub initial_threshold: f32,

    /// Threshold adjustment step, clamped to [0.01, 0.5]
    pub learning_rate: f32,

    /// How long a source-performance analysis stays cached, in seconds
    pub tracker_cache_ttl_secs: u64,

    /// How many recent records the tracker and feedback builder examine
    pub lookback: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            initial_threshold: 0.6,
            learning_rate: 0.05,
            tracker_cache_ttl_secs: 300,
            lookback: 100,
        }
    }
}

/// Fan-out executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanoutConfig {
    /// Maximum number of ranked sources invoked per query
    pub max_sources: usize,

    /// Maximum candidates requested from the catalog before ranking
    pub discover_limit: usize,

    /// Shared deadline for one fan-out batch, in seconds
    pub shared_timeout_secs: u64,

    /// Only consider catalog entries marked as verified
    pub verified_only: bool,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            max_sources: 5,
            discover_limit: 20,
            shared_timeout_secs: 30,
            verified_only: true,
        }
    }
}

/// External oracle endpoints and call budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Text-completion endpoint for refinement and synthesis
    pub reasoning_url: String,

    /// Source-catalog discovery endpoint
    pub catalog_url: String,

    /// Source invocation endpoint
    pub invoke_url: String,

    /// Embedding endpoint
    pub embedding_url: String,

    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,

    /// Sampling temperature for reasoning calls
    pub temperature: f32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            reasoning_url: "http://127.0.0.1:8600/v1/complete".to_string(),
            catalog_url: "http://127.0.0.1:8601/v1/sources/discover".to_string(),
            invoke_url: "http://127.0.0.1:8601/v1/sources/invoke".to_string(),
            embedding_url: "http://127.0.0.1:8602/v1/embed".to_string(),
            request_timeout_secs: 60,
            temperature: 0.3,
        }
    }
}
