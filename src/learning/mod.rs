//! Learning engine
//!
//! Online adjustment of a handful of scalar control parameters from scalar
//! feedback: per-source priority scores, history-driven query refinement,
//! and a hysteresis-adapted confidence threshold. No model training.

pub mod parse;
pub mod refiner;
pub mod threshold;
pub mod tracker;

pub use parse::{parse_oracle_response, ParsedRefinement, MAX_REFINEMENTS};
pub use refiner::{QueryRefiner, RefinementResult};
pub use threshold::{FeedbackSample, LearningState, MAX_THRESHOLD, MIN_SAMPLES, MIN_THRESHOLD};
pub use tracker::{SourceMetric, SourcePerformanceTracker};

/// Records at or above this relevance count as successful patterns, both
/// for refinement and for source success rates
pub const HIGH_QUALITY_THRESHOLD: f32 = 0.7;
