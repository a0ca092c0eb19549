//! Classification transport
//!
//! Executes the primary/fallback protocol against `POST <endpoint>/predict`:
//!
//! 1. Attempt A uses the lenient [`RequestProfile::Primary`] option set.
//! 2. Only a transport-level failure of A (no HTTP response at all) triggers
//!    attempt B with the strict [`RequestProfile::Fallback`] option set.
//! 3. B failing at transport level yields [`ClassifyError::NetworkError`].
//! 4. Any HTTP response ends the protocol; non-2xx is final.
//! 5. A 2xx body goes through the response interpreter.
//!
//! Exactly one retry. No backoff, no loop.

use async_trait::async_trait;
use bytes::Bytes;
use ifv_common::ClassificationResult;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::response_interpreter::interpret;
use crate::models::UploadPayload;

const USER_AGENT: &str = concat!("ifv-client/", env!("CARGO_PKG_VERSION"));

/// Header carrying the explicit cross-origin fetch mode on the fallback attempt
const FETCH_MODE_HEADER: &str = "sec-fetch-mode";

/// Longest error body excerpt carried in [`ClassifyError::HttpError`]
const MAX_ERROR_MESSAGE_LEN: usize = 200;

/// Classification transport errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClassifyError {
    /// Neither attempt obtained an HTTP response
    #[error("Network error: {0}")]
    NetworkError(String),

    /// An HTTP response with a non-2xx status
    #[error("API error: {status}{}", message_suffix(.message))]
    HttpError {
        status: u16,
        message: Option<String>,
    },

    /// A 2xx response whose body did not have the expected shape
    #[error("Parse error: {0}")]
    ParseError(String),
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(" ({})", m),
        None => String::new(),
    }
}

/// Failure that prevented receipt of any HTTP response
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportFailure(pub String);

/// Option set for one request attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestProfile {
    /// Attempt A (and warmup): pooled keep-alive connection, runs on a
    /// detached task so it outlives the caller.
    Primary,
    /// Attempt B: explicit cors fetch mode, `Cache-Control: no-store`, fresh
    /// connection, bound to the caller.
    Fallback,
}

impl RequestProfile {
    /// Whether the request keeps running if the initiating future is dropped
    pub fn survives_teardown(self) -> bool {
        matches!(self, RequestProfile::Primary)
    }

    /// Extra request headers for this profile
    pub fn headers(self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let RequestProfile::Fallback = self {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
            headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
            headers.insert(FETCH_MODE_HEADER, HeaderValue::from_static("cors"));
        }
        headers
    }
}

/// Raw HTTP outcome of one attempt
#[derive(Debug, Clone)]
pub struct RawHttpResponse {
    pub status: u16,
    /// Body, or the error hit while reading it after the status arrived
    pub body: Result<Bytes, String>,
}

impl RawHttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one `/predict` request
///
/// `Err` means no HTTP response was obtained. Any response, whatever its
/// status, is `Ok`.
#[async_trait]
pub trait PredictBackend: Send + Sync {
    async fn post_predict(
        &self,
        payload: &UploadPayload,
        profile: RequestProfile,
    ) -> Result<RawHttpResponse, TransportFailure>;
}

/// Production backend over reqwest
pub struct ReqwestBackend {
    predict_url: String,
    /// Connection-pooling client for [`RequestProfile::Primary`]
    primary: reqwest::Client,
    /// No idle connections kept, so every fallback opens a fresh one
    fallback: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(predict_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ClassifyError> {
        let mut primary = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60));

        let mut fallback = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(0);

        if let Some(timeout) = timeout {
            primary = primary.timeout(timeout);
            fallback = fallback.timeout(timeout);
        }

        Ok(Self {
            predict_url: predict_url.into(),
            primary: primary
                .build()
                .map_err(|e| ClassifyError::NetworkError(e.to_string()))?,
            fallback: fallback
                .build()
                .map_err(|e| ClassifyError::NetworkError(e.to_string()))?,
        })
    }

    pub fn predict_url(&self) -> &str {
        &self.predict_url
    }
}

#[async_trait]
impl PredictBackend for ReqwestBackend {
    async fn post_predict(
        &self,
        payload: &UploadPayload,
        profile: RequestProfile,
    ) -> Result<RawHttpResponse, TransportFailure> {
        let client = match profile {
            RequestProfile::Primary => &self.primary,
            RequestProfile::Fallback => &self.fallback,
        };

        let request = client
            .post(&self.predict_url)
            .headers(profile.headers())
            .multipart(payload.to_form());

        debug!(
            url = %self.predict_url,
            profile = ?profile,
            file_name = %payload.file_name,
            "Sending predict request"
        );

        if profile.survives_teardown() {
            tokio::spawn(send_and_read(request))
                .await
                .map_err(|e| TransportFailure(format!("request task failed: {}", e)))?
        } else {
            send_and_read(request).await
        }
    }
}

async fn send_and_read(request: reqwest::RequestBuilder) -> Result<RawHttpResponse, TransportFailure> {
    let response = request
        .send()
        .await
        .map_err(|e| TransportFailure(error_chain(&e)))?;

    let status = response.status().as_u16();
    let body = response.bytes().await.map_err(|e| error_chain(&e));

    Ok(RawHttpResponse { status, body })
}

/// Display of an error followed by its sources (`a: b: c`)
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Primary/fallback classification protocol
#[derive(Clone)]
pub struct ClassificationTransport {
    backend: Arc<dyn PredictBackend>,
}

impl ClassificationTransport {
    pub fn new(backend: Arc<dyn PredictBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Arc<dyn PredictBackend> {
        Arc::clone(&self.backend)
    }

    /// Classify one payload
    pub async fn classify(&self, payload: &UploadPayload) -> Result<ClassificationResult, ClassifyError> {
        let response = match self.backend.post_predict(payload, RequestProfile::Primary).await {
            Ok(response) => response,
            Err(primary_err) => {
                warn!(error = %primary_err, "Primary predict request failed; retrying with fallback options");

                match self.backend.post_predict(payload, RequestProfile::Fallback).await {
                    Ok(response) => response,
                    Err(fallback_err) => {
                        error!(
                            primary = %primary_err,
                            fallback = %fallback_err,
                            "Both primary and fallback predict requests failed"
                        );
                        let detail = if fallback_err.0.is_empty() {
                            primary_err.0
                        } else {
                            fallback_err.0
                        };
                        return Err(ClassifyError::NetworkError(detail));
                    }
                }
            }
        };

        if !response.is_success() {
            let message = response.body.as_ref().ok().and_then(|b| error_message(b));
            warn!(status = response.status, message = ?message, "Predict request rejected");
            return Err(ClassifyError::HttpError {
                status: response.status,
                message,
            });
        }

        let body = response
            .body
            .map_err(|e| ClassifyError::ParseError(format!("failed to read response body: {}", e)))?;

        let result = interpret(&body)?;

        if let Some(top) = result.top() {
            info!(
                label = %top.label,
                probability = top.probability,
                predictions = result.predictions.len(),
                processing_time = result.processing_time_seconds,
                "Classification successful"
            );
        }

        Ok(result)
    }
}

/// Human-readable message from an error body
///
/// Understands `{"detail": "..."}`, `{"error": "..."}`, `{"message": "..."}`
/// and `{"error": {"message": "..."}}`; otherwise uses the trimmed text.
fn error_message(body: &[u8]) -> Option<String> {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(body) {
        let candidates = [
            json.get("detail"),
            json.get("message"),
            json.get("error").and_then(|e| e.get("message")),
            json.get("error"),
        ];
        if let Some(text) = candidates.into_iter().flatten().find_map(|v| v.as_str()) {
            return Some(truncate(text.trim()));
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    (!text.is_empty()).then(|| truncate(text))
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_profile_headers() {
        let headers = RequestProfile::Fallback.headers();
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "no-store");
        assert_eq!(headers.get(FETCH_MODE_HEADER).unwrap(), "cors");
        assert!(!RequestProfile::Fallback.survives_teardown());
    }

    #[test]
    fn test_primary_profile_is_lenient() {
        assert!(RequestProfile::Primary.headers().is_empty());
        assert!(RequestProfile::Primary.survives_teardown());
    }

    #[test]
    fn test_http_error_display() {
        let err = ClassifyError::HttpError {
            status: 503,
            message: None,
        };
        assert_eq!(err.to_string(), "API error: 503");

        let err = ClassifyError::HttpError {
            status: 400,
            message: Some("Unsupported file type".to_string()),
        };
        assert_eq!(err.to_string(), "API error: 400 (Unsupported file type)");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(br#"{"detail": "Invalid image"}"#).as_deref(),
            Some("Invalid image")
        );
        assert_eq!(
            error_message(br#"{"error": {"message": "boom"}}"#).as_deref(),
            Some("boom")
        );
        assert_eq!(error_message(b"  Service Unavailable \n").as_deref(), Some("Service Unavailable"));
        assert_eq!(error_message(b""), None);
    }

    #[test]
    fn test_long_error_message_truncated() {
        let body = "x".repeat(500);
        let message = error_message(body.as_bytes()).unwrap();
        assert_eq!(message.len(), MAX_ERROR_MESSAGE_LEN + 3);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn test_client_creation() {
        let backend = ReqwestBackend::new("http://127.0.0.1:9/predict", Some(Duration::from_secs(5)));
        assert!(backend.is_ok());
        assert_eq!(backend.unwrap().predict_url(), "http://127.0.0.1:9/predict");
    }
}
