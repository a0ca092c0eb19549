//! Shared test helpers: in-process mock inference server and scripted backends

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use bytes::Bytes;
use ifv_client::models::UploadPayload;
use ifv_client::services::{
    ClassificationSession, ClassificationTransport, ExampleCatalog, PredictBackend,
    RawHttpResponse, RequestProfile, ReqwestBackend, TransportFailure,
};
use ifv_common::events::EventBus;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

pub const BIRYANI_BODY: &str =
    r#"{"predictions": [["biryani", 0.91], ["pulao", 0.05]], "processing_time": 0.042}"#;

/// What the mock server saw for one request
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub field_name: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
    pub cache_control: Option<String>,
    pub fetch_mode: Option<String>,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    /// When present, each response waits for one permit
    gate: Option<Arc<Semaphore>>,
}

/// Mock `/predict` server bound to an ephemeral port
pub struct MockInferenceServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    gate: Option<Arc<Semaphore>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockInferenceServer {
    pub async fn ok(body: &str) -> Self {
        Self::start(StatusCode::OK, body, false).await
    }

    pub async fn status(status: u16, body: &str) -> Self {
        Self::start(StatusCode::from_u16(status).unwrap(), body, false).await
    }

    /// Responses are held until [`release`](Self::release) is called
    pub async fn gated(body: &str) -> Self {
        Self::start(StatusCode::OK, body, true).await
    }

    async fn start(status: StatusCode, body: &str, gated: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let gate = gated.then(|| Arc::new(Semaphore::new(0)));

        let state = MockState {
            status,
            body: body.to_string(),
            requests: requests.clone(),
            gate: gate.clone(),
        };

        let app = Router::new()
            .route("/predict", post(mock_predict))
            .with_state(state);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            requests,
            gate,
            _handle: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.base_url())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Let one held response through
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }
}

async fn mock_predict(
    State(state): State<MockState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let mut recorded = RecordedRequest {
        field_name: None,
        file_name: None,
        content_type: None,
        size: 0,
        cache_control: header("cache-control"),
        fetch_mode: header("sec-fetch-mode"),
    };

    if let Ok(Some(field)) = multipart.next_field().await {
        recorded.field_name = field.name().map(str::to_string);
        recorded.file_name = field.file_name().map(str::to_string);
        recorded.content_type = field.content_type().map(str::to_string);
        recorded.size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
    }

    state.requests.lock().unwrap().push(recorded);

    if let Some(gate) = &state.gate {
        if let Ok(permit) = gate.acquire().await {
            permit.forget();
        }
    }

    (
        state.status,
        [("content-type", "application/json")],
        state.body.clone(),
    )
        .into_response()
}

/// Address nothing listens on
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/predict", addr)
}

/// Scripted backend: pops one outcome per call and records profiles
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<RawHttpResponse, TransportFailure>>>,
    profiles: Mutex<Vec<RequestProfile>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<RawHttpResponse, TransportFailure>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            profiles: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn profiles(&self) -> Vec<RequestProfile> {
        self.profiles.lock().unwrap().clone()
    }
}

#[async_trait]
impl PredictBackend for ScriptedBackend {
    async fn post_predict(
        &self,
        _payload: &UploadPayload,
        profile: RequestProfile,
    ) -> Result<RawHttpResponse, TransportFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.profiles.lock().unwrap().push(profile);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportFailure("script exhausted".to_string())))
    }
}

pub fn http(status: u16, body: &str) -> Result<RawHttpResponse, TransportFailure> {
    Ok(RawHttpResponse {
        status,
        body: Ok(Bytes::from(body.to_string())),
    })
}

pub fn refused(detail: &str) -> Result<RawHttpResponse, TransportFailure> {
    Err(TransportFailure(detail.to_string()))
}

pub fn reqwest_transport(predict_url: &str) -> ClassificationTransport {
    ClassificationTransport::new(Arc::new(ReqwestBackend::new(predict_url, None).unwrap()))
}

pub fn session_with(transport: ClassificationTransport, assets: &std::path::Path) -> ClassificationSession {
    ClassificationSession::new(transport, ExampleCatalog::new(assets), EventBus::new(64))
}
