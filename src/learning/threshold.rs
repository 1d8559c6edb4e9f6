//! Confidence-threshold adaptation
//!
//! A hysteresis controller, not a gradient method: each adjustment moves the
//! threshold by at most one learning-rate step in a direction determined by
//! recent false-positive and false-negative rates. Determinism and
//! boundedness matter more than optimality.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Threshold never adapts below this
pub const MIN_THRESHOLD: f32 = 0.3;

/// Threshold never adapts above this
pub const MAX_THRESHOLD: f32 = 0.9;

/// Fewer samples than this and adjustment is a no-op
pub const MIN_SAMPLES: usize = 10;

const MIN_LEARNING_RATE: f32 = 0.01;
const MAX_LEARNING_RATE: f32 = 0.5;

/// One (predicted confidence, observed relevance) pair.
///
/// Built on demand from recent memory records that carry refinement
/// metadata; never persisted separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackSample {
    pub source_query_id: Uuid,
    pub predicted_confidence: f32,
    pub observed_relevance: f32,
    pub timestamp: DateTime<Utc>,
}

/// Mutable learning state owned by one orchestrator instance.
///
/// Explicitly constructed and injected rather than module-global, so
/// multiple independent agent instances can run in one process.
#[derive(Debug, Clone)]
pub struct LearningState {
    confidence_threshold: f32,
    learning_rate: f32,
}

impl LearningState {
    /// Create a state with both parameters clamped into their legal ranges
    pub fn new(initial_threshold: f32, learning_rate: f32) -> Self {
        Self {
            confidence_threshold: initial_threshold.clamp(MIN_THRESHOLD, MAX_THRESHOLD),
            learning_rate: learning_rate.clamp(MIN_LEARNING_RATE, MAX_LEARNING_RATE),
        }
    }

    /// Current acceptance threshold
    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Current adjustment step
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Retune the threshold from recent feedback, returning the new value.
    ///
    /// Requires at least [`MIN_SAMPLES`] samples or leaves the threshold
    /// unchanged. Too many false positives raise the threshold (be more
    /// conservative); too many false negatives lower it (be more
    /// permissive); both rates under 0.05 lower it by half a step.
    pub fn adjust(&mut self, samples: &[FeedbackSample]) -> f32 {
        if samples.len() < MIN_SAMPLES {
            tracing::debug!(
                samples = samples.len(),
                "Not enough feedback to adjust threshold"
            );
            return self.confidence_threshold;
        }

        let total = samples.len() as f32;
        let threshold = self.confidence_threshold;

        let false_positives = samples
            .iter()
            .filter(|s| s.predicted_confidence > threshold && s.observed_relevance < 0.5)
            .count() as f32;
        let false_negatives = samples
            .iter()
            .filter(|s| s.predicted_confidence <= threshold && s.observed_relevance >= 0.7)
            .count() as f32;

        let fp_rate = false_positives / total;
        let fn_rate = false_negatives / total;

        let adjusted = if fp_rate > 0.2 {
            threshold + self.learning_rate
        } else if fn_rate > 0.2 {
            threshold - self.learning_rate
        } else if fp_rate < 0.05 && fn_rate < 0.05 {
            // Performing well: explore slightly more aggressively
            threshold - self.learning_rate / 2.0
        } else {
            threshold
        };

        self.confidence_threshold = adjusted.clamp(MIN_THRESHOLD, MAX_THRESHOLD);
        if (self.confidence_threshold - threshold).abs() > f32::EPSILON {
            tracing::info!(
                fp_rate,
                fn_rate,
                old = threshold,
                new = self.confidence_threshold,
                "Confidence threshold adjusted"
            );
        }
        self.confidence_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(predicted: f32, observed: f32) -> FeedbackSample {
        FeedbackSample {
            source_query_id: Uuid::new_v4(),
            predicted_confidence: predicted,
            observed_relevance: observed,
            timestamp: Utc::now(),
        }
    }

    /// n samples where prediction was confident but relevance was poor
    fn false_positive_batch(n: usize) -> Vec<FeedbackSample> {
        (0..n).map(|_| sample(0.9, 0.1)).collect()
    }

    /// n samples where prediction was timid but relevance was high
    fn false_negative_batch(n: usize) -> Vec<FeedbackSample> {
        (0..n).map(|_| sample(0.3, 0.9)).collect()
    }

    /// n samples the controller counts as neither FP nor FN
    fn accurate_batch(n: usize) -> Vec<FeedbackSample> {
        (0..n).map(|_| sample(0.9, 0.9)).collect()
    }

    #[test]
    fn test_clamps_on_construction() {
        let state = LearningState::new(0.1, 2.0);
        assert!((state.confidence_threshold() - MIN_THRESHOLD).abs() < f32::EPSILON);
        assert!((state.learning_rate() - MAX_LEARNING_RATE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_too_few_samples_is_noop() {
        let mut state = LearningState::new(0.6, 0.05);
        let new = state.adjust(&false_positive_batch(MIN_SAMPLES - 1));
        assert!((new - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_false_positives_raise_threshold() {
        let mut state = LearningState::new(0.6, 0.05);
        let new = state.adjust(&false_positive_batch(10));
        assert!((new - 0.65).abs() < 0.001);
    }

    #[test]
    fn test_false_negatives_lower_threshold() {
        let mut state = LearningState::new(0.6, 0.05);
        let new = state.adjust(&false_negative_batch(10));
        assert!((new - 0.55).abs() < 0.001);
    }

    #[test]
    fn test_performing_well_explores_down() {
        let mut state = LearningState::new(0.6, 0.05);
        let new = state.adjust(&accurate_batch(10));
        assert!((new - 0.575).abs() < 0.001);
    }

    #[test]
    fn test_mixed_rates_unchanged() {
        // 10% FP, 10% FN: neither trigger fires, not "performing well"
        let mut samples = accurate_batch(16);
        samples.extend(false_positive_batch(2));
        samples.extend(false_negative_batch(2));

        let mut state = LearningState::new(0.6, 0.05);
        let new = state.adjust(&samples);
        assert!((new - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_upper_bound() {
        let mut state = LearningState::new(0.88, 0.05);
        let new = state.adjust(&false_positive_batch(10));
        assert!((new - MAX_THRESHOLD).abs() < f32::EPSILON);
    }

    #[test]
    fn test_lower_bound() {
        let mut state = LearningState::new(0.32, 0.05);
        let new = state.adjust(&false_negative_batch(10));
        assert!((new - MIN_THRESHOLD).abs() < f32::EPSILON);
    }

    #[test]
    fn test_repeated_adjustment_is_monotone_until_bound() {
        let mut state = LearningState::new(0.6, 0.1);
        let mut last = state.confidence_threshold();
        for _ in 0..5 {
            let new = state.adjust(&false_positive_batch(10));
            assert!(new >= last);
            last = new;
        }
        assert!((last - MAX_THRESHOLD).abs() < f32::EPSILON);
    }
}
