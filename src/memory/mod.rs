//! Vector-addressed memory
//!
//! Records pair a query embedding with its outcome and a mutable relevance
//! score. The store owns expiry and dimension validation; backends own
//! persistence and k-NN search.

pub mod backend;
pub mod record;
pub mod similarity;
pub mod store;

pub use backend::{InMemoryBackend, MemoryBackend, SearchFilter};
pub use record::{
    MemoryMetrics, MemoryRecord, NewRecord, RefinementMeta, ResultDigest, ScoredRecord,
};
pub use similarity::cosine_similarity;
pub use store::MemoryStore;
