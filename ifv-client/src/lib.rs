//! ifv-client library interface
//!
//! Classification request lifecycle for the Indian Food Vision inference
//! service, plus the local HTTP surface a web UI renders from.

pub mod api;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use ifv_common::config::IfvConfig;
use ifv_common::events::EventBus;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::{
    ClassificationSession, ClassificationTransport, ClassifyError, ExampleCatalog, PredictBackend,
    ReqwestBackend,
};

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: ClassificationSession,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(session: ClassificationSession) -> Self {
        Self {
            event_bus: session.event_bus().clone(),
            session,
            startup_time: Utc::now(),
        }
    }
}

/// Wire a session against the configured inference endpoint
pub fn build_session(config: &IfvConfig, event_bus: EventBus) -> Result<ClassificationSession, ClassifyError> {
    let backend: Arc<dyn PredictBackend> =
        Arc::new(ReqwestBackend::new(config.predict_url(), config.request_timeout)?);

    Ok(ClassificationSession::new(
        ClassificationTransport::new(backend),
        ExampleCatalog::new(config.static_assets.clone()),
        event_bus,
    ))
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    // Catalog asset previews are relative to the static root
    let assets = ServeDir::new(state.session.catalog().root());

    Router::new()
        .merge(api::session_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .nest_service("/static", assets)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
