//! Payload normalizer
//!
//! Turns any [`ImageSubmission`] into the canonical [`UploadPayload`]. The
//! inference endpoint mishandles file names containing spaces or missing
//! entirely, so both are fixed up here. Total: never fails.

use crate::models::{ImageSubmission, UploadPayload};

/// Extension used when the MIME type has no usable subtype
const FALLBACK_EXTENSION: &str = "bin";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Build the canonical upload payload for a submission
pub fn normalize(submission: ImageSubmission) -> UploadPayload {
    let (bytes, declared_name, mime_type) = submission.into_parts();

    let content_type = if is_well_formed_mime(&mime_type) {
        mime_type.trim().to_string()
    } else {
        FALLBACK_CONTENT_TYPE.to_string()
    };

    let file_name = if declared_name.is_empty() {
        format!("upload.{}", mime_subtype(&mime_type).unwrap_or(FALLBACK_EXTENSION))
    } else {
        sanitize_file_name(&declared_name)
    };

    tracing::debug!(
        file_name = %file_name,
        content_type = %content_type,
        size = bytes.len(),
        "Normalized upload payload"
    );

    UploadPayload {
        file_name,
        content_type,
        bytes,
    }
}

/// Replace every maximal run of whitespace with a single underscore
pub fn sanitize_file_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                sanitized.push('_');
            }
            in_whitespace = true;
        } else {
            sanitized.push(c);
            in_whitespace = false;
        }
    }

    sanitized
}

/// Subtype of `type/subtype[; params]`, if it is usable as an extension
fn mime_subtype(mime_type: &str) -> Option<&str> {
    let essence = mime_type.split(';').next()?.trim();
    let (_, subtype) = essence.rsplit_once('/')?;
    let valid = !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(subtype)
}

fn is_well_formed_mime(mime_type: &str) -> bool {
    let essence = mime_type.split(';').next().unwrap_or("").trim();
    match essence.split_once('/') {
        Some((kind, _)) => !kind.is_empty() && mime_subtype(essence).is_some(),
        None => false,
    }
}
