//! # hindsight
//!
//! A self-adjusting retrieval-and-ranking agent. Every answered query is
//! remembered as an embedded record; later, similar queries retrieve those
//! records to refine themselves, prefer historically good sources, and tune
//! the confidence threshold that gates how aggressively refinements apply.
//!
//! ```text
//!            ┌────────────────────────────────────────────────┐
//!            │              LearningOrchestrator              │
//! query ───> │ embed -> recall -> refine -> rank -> fan-out   │ ───> outcome
//!            │                 │                      │       │
//!            │           MemoryStore <── record <── synthesis │
//!            └────────────────────────────────────────────────┘
//! ```
//!
//! The external world is reached through three injectable traits — a
//! [`oracle::ReasoningOracle`] for completions, a [`oracle::SourceCatalog`]
//! for discovery, and a [`oracle::SourceInvoker`] for invocation — with
//! reqwest-backed implementations in [`oracle::http`]. Everything else is
//! in-process.
//!
//! ## Quick start
//!
//! ```no_run
//! use hindsight::{HindsightConfig, LearningOrchestrator, QueryRequest};
//! use hindsight::embedding::HttpEmbedding;
//! use hindsight::memory::MemoryStore;
//! use hindsight::oracle::http::{HttpReasoningOracle, HttpSourceCatalog, HttpSourceInvoker};
//! use std::sync::Arc;
//!
//! # async fn run() -> hindsight::Result<()> {
//! let config = HindsightConfig::from_json_file("hindsight.json")?;
//! let store = Arc::new(MemoryStore::in_memory(&config.memory));
//! let embedder = Arc::new(HttpEmbedding::new(&config.oracle, config.memory.dimension));
//! let orchestrator = LearningOrchestrator::new(
//!     config.clone(),
//!     store,
//!     embedder,
//!     Arc::new(HttpReasoningOracle::new(&config.oracle)),
//!     Arc::new(HttpSourceCatalog::new(&config.oracle)),
//!     Arc::new(HttpSourceInvoker::new(&config.oracle)),
//! );
//!
//! let outcome = orchestrator.answer(QueryRequest::new("latest AI trends")).await;
//! println!("{:?}", outcome.answer);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod embedding;
pub mod error;
pub mod learning;
pub mod memory;
pub mod oracle;
pub mod orchestrator;
pub mod sources;

pub use config::HindsightConfig;
pub use error::{Error, Result};
pub use orchestrator::{LearningOrchestrator, QueryOutcome, QueryRequest};
