//! Classification result types
//!
//! Produced by the response interpreter and carried inside
//! [`SessionState::Success`](crate::events::SessionState::Success).

use serde::{Deserialize, Serialize};

use crate::human_format::{format_probability, format_processing_time};

/// Number of predictions a presenter shows (top-1 plus four runners-up)
pub const DISPLAYED_PREDICTIONS: usize = 5;

/// One label with its confidence score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationLabelScore {
    /// Class label as reported by the inference service
    pub label: String,
    /// Confidence in [0.0, 1.0]
    pub probability: f64,
}

impl ClassificationLabelScore {
    pub fn new(label: impl Into<String>, probability: f64) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }

    /// Probability on the percentage scale with one decimal (e.g. "87.3%")
    pub fn percentage(&self) -> String {
        format_probability(self.probability)
    }
}

/// Ranked classification output for one submission
///
/// `predictions` keeps the server's order and is never empty. Entries past
/// [`DISPLAYED_PREDICTIONS`] are retained even though presenters skip them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub predictions: Vec<ClassificationLabelScore>,
    /// Server-reported inference time, unrounded
    pub processing_time_seconds: f64,
}

impl ClassificationResult {
    /// Highest-ranked prediction
    pub fn top(&self) -> Option<&ClassificationLabelScore> {
        self.predictions.first()
    }

    /// Up to four predictions following the top one
    pub fn runners_up(&self) -> &[ClassificationLabelScore] {
        let end = self.predictions.len().min(DISPLAYED_PREDICTIONS);
        self.predictions.get(1..end).unwrap_or(&[])
    }

    /// Processing time with three decimals (e.g. "0.042")
    pub fn processing_time_display(&self) -> String {
        format_processing_time(self.processing_time_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(count: usize) -> ClassificationResult {
        ClassificationResult {
            predictions: (0..count)
                .map(|i| ClassificationLabelScore::new(format!("dish_{}", i), 0.5 / (i + 1) as f64))
                .collect(),
            processing_time_seconds: 0.1234,
        }
    }

    #[test]
    fn test_top_is_first_prediction() {
        let result = result_with(3);
        assert_eq!(result.top().unwrap().label, "dish_0");
    }

    #[test]
    fn test_runners_up_capped_at_four() {
        let result = result_with(8);
        let runners_up = result.runners_up();
        assert_eq!(runners_up.len(), 4);
        assert_eq!(runners_up[0].label, "dish_1");
        assert_eq!(runners_up[3].label, "dish_4");
        // Entries past the fifth are still retained
        assert_eq!(result.predictions.len(), 8);
    }

    #[test]
    fn test_runners_up_with_short_list() {
        assert!(result_with(1).runners_up().is_empty());
        assert_eq!(result_with(2).runners_up().len(), 1);
    }

    #[test]
    fn test_processing_time_display() {
        assert_eq!(result_with(1).processing_time_display(), "0.123");
    }
}
