//! Warmup prober
//!
//! Fires one throwaway `/predict` request at startup so a cold inference
//! service is already spinning up when the first real image arrives. The
//! outcome is discarded; only completion is recorded in [`WarmupStatus`],
//! which presenters use to pick the loading copy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use ifv_common::events::{EventBus, IfvEvent};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::classification_transport::{PredictBackend, RequestProfile};
use crate::models::UploadPayload;

/// Process-wide warmup completion flag
///
/// Starts `false`; flips to `true` exactly once when the warmup request
/// settles. Only the prober in this module can set it.
#[derive(Debug, Clone, Default)]
pub struct WarmupStatus {
    started: Arc<AtomicBool>,
    settled: Arc<AtomicBool>,
}

impl WarmupStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the warmup request has completed (success or failure)
    pub fn is_warmed(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> bool {
        !self.started.swap(true, Ordering::AcqRel)
    }

    /// Returns false if already settled
    fn mark_settled(&self) -> bool {
        !self.settled.swap(true, Ordering::AcqRel)
    }
}

/// Zero-byte placeholder image sent by the warmup request
pub fn warmup_payload() -> UploadPayload {
    UploadPayload {
        file_name: "warmup.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
        bytes: Bytes::new(),
    }
}

pub struct WarmupProber {
    backend: Arc<dyn PredictBackend>,
    status: WarmupStatus,
    event_bus: EventBus,
}

impl WarmupProber {
    pub fn new(backend: Arc<dyn PredictBackend>, status: WarmupStatus, event_bus: EventBus) -> Self {
        Self {
            backend,
            status,
            event_bus,
        }
    }

    /// Start the warmup request on a detached task
    ///
    /// Returns `None` if warmup already ran for this status handle. The
    /// handle may be dropped; the task keeps running.
    pub fn spawn(self) -> Option<JoinHandle<()>> {
        if !self.status.try_begin() {
            debug!("Warmup already started; ignoring");
            return None;
        }

        info!("Warming up inference service");

        Some(tokio::spawn(async move {
            let payload = warmup_payload();
            match self.backend.post_predict(&payload, RequestProfile::Primary).await {
                Ok(response) => debug!(status = response.status, "Warmup request completed"),
                Err(e) => debug!(error = %e, "Warmup request failed (ignored)"),
            }

            if self.status.mark_settled() {
                info!("Inference service warmup settled");
                self.event_bus.emit_lossy(IfvEvent::WarmupCompleted {
                    timestamp: chrono::Utc::now(),
                });
            }
        }))
    }
}
