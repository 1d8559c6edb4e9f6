//! Text embedding providers
//!
//! An [`EmbeddingProvider`] maps free text to a fixed-length vector. The
//! dimension is fixed system-wide and every consumer validates it. A
//! deterministic hash-based fallback ([`HashedEmbedding`]) keeps the whole
//! loop testable without a live model.

pub mod hashed;
pub mod http;

pub use hashed::HashedEmbedding;
pub use http::HttpEmbedding;

use crate::error::Result;
use async_trait::async_trait;

/// Maps free text to a fixed-length numeric vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// The fixed output dimension of this provider
    fn dimension(&self) -> usize;

    /// Embed one text into a vector of exactly `dimension()` values
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
