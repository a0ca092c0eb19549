//! Session state types shared between the state machine and presenters

use serde::{Deserialize, Serialize};

use crate::classification::ClassificationResult;

/// Displayable form of the submitted image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "src")]
pub enum Preview {
    /// Decoded user upload (`data:<mime>;base64,...`)
    DataUrl(String),
    /// Pre-supplied catalog asset, shown without a decode step
    Asset(String),
}

/// What the presentation layer is allowed to observe
///
/// Exactly one variant is active at a time. Only the session state machine
/// transitions between variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum SessionState {
    /// No submission in flight, no result, no error
    Idle,

    /// A classification is in flight
    Loading {
        /// Whether the preview for the in-flight submission is ready
        preview_available: bool,
    },

    /// Transport succeeded
    Success {
        result: ClassificationResult,
        /// Absent if the preview decode has not finished (or failed)
        preview: Option<Preview>,
    },

    /// Any failure, rendered as a human-readable message
    Error {
        message: String,
        preview: Option<Preview>,
    },
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading { .. })
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        match self {
            SessionState::Success { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn preview(&self) -> Option<&Preview> {
        match self {
            SessionState::Success { preview, .. } | SessionState::Error { preview, .. } => {
                preview.as_ref()
            }
            _ => None,
        }
    }

    /// Short label for logging and SSE event names
    pub fn status_name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Loading { .. } => "Loading",
            SessionState::Success { .. } => "Success",
            SessionState::Error { .. } => "Error",
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}
