//! Response interpreter
//!
//! Validates a 2xx `/predict` body and reshapes it into a
//! [`ClassificationResult`]. Server ordering is trusted; nothing is re-sorted.
//!
//! Expected body:
//! ```json
//! { "predictions": [["biryani", 0.91], ["pulao", 0.05]], "processing_time": 0.042 }
//! ```

use ifv_common::{ClassificationLabelScore, ClassificationResult};
use serde::Deserialize;

use super::classification_transport::ClassifyError;

#[derive(Debug, Deserialize)]
struct RawPredictResponse {
    predictions: Vec<(String, f64)>,
    processing_time: f64,
}

/// Parse a raw response body into the domain result
pub fn interpret(raw_body: &[u8]) -> Result<ClassificationResult, ClassifyError> {
    let raw: RawPredictResponse = serde_json::from_slice(raw_body)
        .map_err(|e| ClassifyError::ParseError(e.to_string()))?;

    if raw.predictions.is_empty() {
        return Err(ClassifyError::ParseError(
            "predictions must not be empty".to_string(),
        ));
    }

    if let Some((label, probability)) = raw
        .predictions
        .iter()
        .find(|(_, p)| !(0.0..=1.0).contains(p))
    {
        return Err(ClassifyError::ParseError(format!(
            "probability {} for '{}' is outside [0, 1]",
            probability, label
        )));
    }

    if !raw.processing_time.is_finite() || raw.processing_time < 0.0 {
        return Err(ClassifyError::ParseError(format!(
            "invalid processing_time {}",
            raw.processing_time
        )));
    }

    Ok(ClassificationResult {
        predictions: raw
            .predictions
            .into_iter()
            .map(|(label, probability)| ClassificationLabelScore { label, probability })
            .collect(),
        processing_time_seconds: raw.processing_time,
    })
}
