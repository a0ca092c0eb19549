//! Human-readable formatting for classification output
//!
//! Provides consistent display formatting for every presenter (HTTP surface,
//! CLI, web UI).

/// Format a probability in [0, 1] as a percentage with one decimal.
///
/// # Examples
///
/// ```
/// use ifv_common::human_format::format_probability;
///
/// assert_eq!(format_probability(0.8734), "87.3%");
/// assert_eq!(format_probability(0.91), "91.0%");
/// assert_eq!(format_probability(1.0), "100.0%");
/// ```
pub fn format_probability(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

/// Format a processing time in seconds with three decimals.
///
/// # Examples
///
/// ```
/// use ifv_common::human_format::format_processing_time;
///
/// assert_eq!(format_processing_time(0.042), "0.042");
/// assert_eq!(format_processing_time(1.5), "1.500");
/// ```
pub fn format_processing_time(seconds: f64) -> String {
    format!("{:.3}", seconds)
}

/// Copy shown while a classification is in flight.
///
/// Before the warmup request has settled the server is assumed to be cold.
pub fn loading_message(warmed: bool) -> &'static str {
    if warmed {
        "Processing..."
    } else {
        "Waking up server (first request)..."
    }
}
