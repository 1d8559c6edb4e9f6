//! Hindsight error types

use thiserror::Error;

/// Hindsight error type
///
/// Only `DimensionMismatch` and `InvalidScore` are surfaced to callers as
/// hard failures; they indicate shape/range violations on direct inputs.
/// Everything else is absorbed at the component boundary and converted into
/// a degraded-but-valid result (empty retrieval, neutral refinement, failed
/// invocation outcome).
#[derive(Error, Debug)]
pub enum Error {
    /// Embedding length does not match the configured dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Relevance score outside [0, 1]
    #[error("Invalid relevance score: {0}")]
    InvalidScore(f32),

    /// Persistence backend unreachable or failing
    #[error("Backend error: {0}")]
    Backend(String),

    /// External oracle (reasoning, catalog, invocation, embedding) failure
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// Shared fan-out deadline exceeded before all invocations finished
    #[error("Batch timeout after {0} ms")]
    BatchTimeout(u64),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Hindsight operations
pub type Result<T> = std::result::Result<T, Error>;
