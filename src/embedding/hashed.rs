//! Deterministic hash-based embedding fallback
//!
//! Expands a SHA-256 digest of the input text cyclically into the configured
//! dimension, mapping each byte into [-1, 1]. Identical texts always produce
//! identical vectors, which is what the retrieval loop needs to stay testable
//! without a live embedding model. There is no semantic similarity between
//! different texts.

use super::EmbeddingProvider;
use crate::error::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Content-hash embedding provider
pub struct HashedEmbedding {
    dimension: usize,
}

impl HashedEmbedding {
    /// Create a provider producing vectors of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Expand the text hash into `dimension` values in [-1, 1].
    ///
    /// Each 32-byte block is the digest of the text plus a block counter, so
    /// dimensions above 32 keep full byte entropy instead of repeating.
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut values = Vec::with_capacity(self.dimension);
        let mut block: u32 = 0;

        while values.len() < self.dimension {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            hasher.update(block.to_le_bytes());
            let digest = hasher.finalize();

            for byte in digest {
                if values.len() == self.dimension {
                    break;
                }
                values.push(byte as f32 / 127.5 - 1.0);
            }
            block += 1;
        }

        values
    }
}

#[async_trait]
impl EmbeddingProvider for HashedEmbedding {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deterministic() {
        let provider = HashedEmbedding::new(64);
        let a = provider.embed("AI trends").await.unwrap();
        let b = provider.embed("AI trends").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_distinct_texts_differ() {
        let provider = HashedEmbedding::new(64);
        let a = provider.embed("AI trends").await.unwrap();
        let b = provider.embed("quarterly sales").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_dimension_and_range() {
        for dim in [8, 32, 100, 1024] {
            let provider = HashedEmbedding::new(dim);
            let v = provider.embed("check").await.unwrap();
            assert_eq!(v.len(), dim);
            assert!(v.iter().all(|x| (-1.0..=1.0).contains(x)));
        }
    }

    #[test]
    fn test_blocks_do_not_repeat() {
        // A 64-dim vector spans two digest blocks; they must differ
        let provider = HashedEmbedding::new(64);
        let v = provider.vectorize("entropy");
        assert_ne!(&v[..32], &v[32..]);
    }
}
