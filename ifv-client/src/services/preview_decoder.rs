//! Preview rendering for uploaded images
//!
//! Produces a `data:` URL a browser can display directly. Runs on the
//! blocking pool since large images make base64 encoding noticeable.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use ifv_common::events::Preview;

/// Encode image bytes as a `data:<mime>;base64,...` URL
///
/// An empty or missing MIME type is sniffed from the content.
pub fn to_data_url(bytes: &[u8], mime_type: &str) -> String {
    let mime = if mime_type.trim().is_empty() {
        sniff_mime(bytes)
    } else {
        mime_type.trim()
    };
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// MIME type from magic bytes, `application/octet-stream` if unknown
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream")
}

/// Decode submitted bytes into a displayable preview
pub async fn decode_preview(bytes: Bytes, mime_type: String) -> Option<Preview> {
    match tokio::task::spawn_blocking(move || to_data_url(&bytes, &mime_type)).await {
        Ok(url) => Some(Preview::DataUrl(url)),
        Err(e) => {
            tracing::warn!("Preview decode task failed: {}", e);
            None
        }
    }
}
