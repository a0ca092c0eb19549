//! Submission and upload payload types

use bytes::Bytes;

/// Multipart field the inference endpoint reads the image from
pub const UPLOAD_FIELD_NAME: &str = "file";

/// An image entering the classification pipeline
///
/// Built from a user upload or a resolved catalog example. Immutable once
/// constructed; consumed by exactly one submission attempt.
#[derive(Debug, Clone)]
pub struct ImageSubmission {
    bytes: Bytes,
    declared_name: String,
    mime_type: String,
}

impl ImageSubmission {
    pub fn new(
        bytes: impl Into<Bytes>,
        declared_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            declared_name: declared_name.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub(crate) fn into_parts(self) -> (Bytes, String, String) {
        (self.bytes, self.declared_name, self.mime_type)
    }
}

/// Canonical upload built by the payload normalizer
///
/// `file_name` never contains whitespace and is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadPayload {
    /// Multipart form carrying this payload in the `file` field
    ///
    /// A form is single-use, so each request attempt builds its own.
    pub fn to_form(&self) -> reqwest::multipart::Form {
        let part = reqwest::multipart::Part::bytes(self.bytes.to_vec())
            .file_name(self.file_name.clone());

        // content_type is already validated by the normalizer
        let part = match part.mime_str(&self.content_type) {
            Ok(part) => part,
            Err(_) => reqwest::multipart::Part::bytes(self.bytes.to_vec())
                .file_name(self.file_name.clone()),
        };

        reqwest::multipart::Form::new().part(UPLOAD_FIELD_NAME, part)
    }
}
