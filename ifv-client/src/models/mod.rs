//! Data models for ifv-client

pub mod submission;

pub use submission::{ImageSubmission, UploadPayload, UPLOAD_FIELD_NAME};
