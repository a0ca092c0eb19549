//! Primary/fallback protocol against scripted and live HTTP backends

mod common;

use bytes::Bytes;
use common::{closed_port_url, http, refused, reqwest_transport, MockInferenceServer, ScriptedBackend, BIRYANI_BODY};
use ifv_client::models::{ImageSubmission, UploadPayload};
use ifv_client::services::{
    normalize, ClassificationTransport, ClassifyError, RawHttpResponse, RequestProfile,
};

fn jpeg_payload() -> UploadPayload {
    normalize(ImageSubmission::new(
        vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10],
        "my lunch.jpg",
        "image/jpeg",
    ))
}

#[tokio::test]
async fn test_fallback_after_primary_network_failure() {
    let backend = ScriptedBackend::new(vec![refused("connection reset"), http(200, BIRYANI_BODY)]);
    let transport = ClassificationTransport::new(backend.clone());

    let result = transport.classify(&jpeg_payload()).await.unwrap();

    assert_eq!(backend.calls(), 2);
    assert_eq!(
        backend.profiles(),
        vec![RequestProfile::Primary, RequestProfile::Fallback]
    );
    assert_eq!(result.top().unwrap().label, "biryani");
}

#[tokio::test]
async fn test_http_error_is_not_retried() {
    let backend = ScriptedBackend::new(vec![http(503, ""), http(200, BIRYANI_BODY)]);
    let transport = ClassificationTransport::new(backend.clone());

    let err = transport.classify(&jpeg_payload()).await.unwrap_err();

    assert_eq!(backend.calls(), 1);
    assert_eq!(
        err,
        ClassifyError::HttpError {
            status: 503,
            message: None
        }
    );
    assert_eq!(err.to_string(), "API error: 503");
}

#[tokio::test]
async fn test_both_attempts_fail_with_network_error() {
    let backend = ScriptedBackend::new(vec![refused("dns failure"), refused("connection refused")]);
    let transport = ClassificationTransport::new(backend.clone());

    let err = transport.classify(&jpeg_payload()).await.unwrap_err();

    assert_eq!(backend.calls(), 2);
    assert!(matches!(err, ClassifyError::NetworkError(ref d) if d.contains("connection refused")));
}

#[tokio::test]
async fn test_fallback_http_error_is_final() {
    let backend = ScriptedBackend::new(vec![refused("reset"), http(500, r#"{"detail": "model crashed"}"#)]);
    let transport = ClassificationTransport::new(backend.clone());

    let err = transport.classify(&jpeg_payload()).await.unwrap_err();

    assert_eq!(backend.calls(), 2);
    assert_eq!(
        err,
        ClassifyError::HttpError {
            status: 500,
            message: Some("model crashed".to_string())
        }
    );
}

#[tokio::test]
async fn test_malformed_success_body_is_parse_error() {
    let backend = ScriptedBackend::new(vec![http(200, r#"{"predictions": "nope"}"#)]);
    let transport = ClassificationTransport::new(backend.clone());

    let err = transport.classify(&jpeg_payload()).await.unwrap_err();

    assert_eq!(backend.calls(), 1);
    assert!(matches!(err, ClassifyError::ParseError(_)));
}

#[tokio::test]
async fn test_body_read_failure_after_status_is_parse_error() {
    let backend = ScriptedBackend::new(vec![Ok(RawHttpResponse {
        status: 200,
        body: Err("connection closed mid-body".to_string()),
    })]);
    let transport = ClassificationTransport::new(backend.clone());

    let err = transport.classify(&jpeg_payload()).await.unwrap_err();

    assert_eq!(backend.calls(), 1);
    assert!(matches!(err, ClassifyError::ParseError(ref d) if d.contains("mid-body")));
}

#[tokio::test]
async fn test_live_success_sends_sanitized_multipart() {
    let server = MockInferenceServer::ok(BIRYANI_BODY).await;
    let transport = reqwest_transport(&server.predict_url());

    let result = transport.classify(&jpeg_payload()).await.unwrap();

    assert_eq!(result.predictions.len(), 2);
    assert_eq!(result.top().unwrap().percentage(), "91.0%");
    assert_eq!(result.processing_time_display(), "0.042");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.field_name.as_deref(), Some("file"));
    assert_eq!(request.file_name.as_deref(), Some("my_lunch.jpg"));
    assert_eq!(request.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(request.size, 6);
    // Primary attempt carries no cache override
    assert!(request.cache_control.is_none());
}

#[tokio::test]
async fn test_live_http_error_single_request() {
    let server = MockInferenceServer::status(503, "Service Unavailable").await;
    let transport = reqwest_transport(&server.predict_url());

    let err = transport.classify(&jpeg_payload()).await.unwrap_err();

    assert_eq!(server.request_count(), 1);
    assert_eq!(
        err,
        ClassifyError::HttpError {
            status: 503,
            message: Some("Service Unavailable".to_string())
        }
    );
}

#[tokio::test]
async fn test_live_unreachable_endpoint_is_network_error() {
    let transport = reqwest_transport(&closed_port_url().await);

    let err = transport.classify(&jpeg_payload()).await.unwrap_err();

    assert!(matches!(err, ClassifyError::NetworkError(_)));
}

#[tokio::test]
async fn test_live_fallback_profile_headers() {
    let server = MockInferenceServer::ok(BIRYANI_BODY).await;
    let backend = ifv_client::services::ReqwestBackend::new(server.predict_url(), None).unwrap();

    use ifv_client::services::PredictBackend;
    let response = backend
        .post_predict(&jpeg_payload(), RequestProfile::Fallback)
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.body.unwrap(), Bytes::from(BIRYANI_BODY));

    let request = &server.requests()[0];
    assert_eq!(request.cache_control.as_deref(), Some("no-store"));
    assert_eq!(request.fetch_mode.as_deref(), Some("cors"));
}
