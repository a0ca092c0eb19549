//! # IFV Common Library
//!
//! Shared code for the Indian Food Vision client including:
//! - Classification result types
//! - Session state and event types (IfvEvent enum, EventBus)
//! - Configuration loading
//! - Display formatting for probabilities and processing times

pub mod classification;
pub mod config;
pub mod error;
pub mod events;
pub mod human_format;
pub mod sse;

pub use classification::{ClassificationLabelScore, ClassificationResult};
pub use error::{Error, Result};
