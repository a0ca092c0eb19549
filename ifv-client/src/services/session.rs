//! Session state machine
//!
//! Single owner of the observable [`SessionState`]:
//!
//! ```text
//! Idle ──submit──▶ Loading ──transport ok──▶ Success ──clear──▶ Idle
//!                     └─────transport err──▶ Error   ──clear──▶ Idle
//! ```
//!
//! Each submission spawns two independent tasks back-to-back: a preview
//! decode and the classification pipeline. Only the pipeline decides the
//! terminal transition; the preview just fills in whichever state is current
//! when it lands. A submission while `Loading` is refused, never queued.

use std::sync::Arc;

use ifv_common::events::{EventBus, IfvEvent, Preview, SessionState};
use ifv_common::human_format::loading_message;
use ifv_common::ClassificationResult;
use tokio::sync::RwLock;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::classification_transport::{ClassificationTransport, ClassifyError};
use super::example_catalog::{CatalogError, ExampleAsset, ExampleCatalog};
use super::payload_normalizer::normalize;
use super::preview_decoder::decode_preview;
use super::warmup_prober::{WarmupProber, WarmupStatus};
use crate::models::ImageSubmission;

/// Shown for transport-level failures instead of the raw error text
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error: failed to contact prediction API. Check CORS, network, or server status.";

/// User-facing message for a failed classification
pub fn failure_message(err: &ClassifyError) -> String {
    match err {
        ClassifyError::NetworkError(_) => NETWORK_ERROR_MESSAGE.to_string(),
        ClassifyError::HttpError { .. } => err.to_string(),
        ClassifyError::ParseError(detail) => format!("Failed to classify image: {}", detail),
    }
}

/// Result of asking the session to start a submission
#[derive(Debug)]
pub enum SubmitOutcome {
    Started(SubmissionHandle),
    /// A classification was already in flight; nothing was started
    Rejected,
}

impl SubmitOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, SubmitOutcome::Started(_))
    }

    pub fn into_handle(self) -> Option<SubmissionHandle> {
        match self {
            SubmitOutcome::Started(handle) => Some(handle),
            SubmitOutcome::Rejected => None,
        }
    }
}

/// Handle on an in-flight submission
///
/// Dropping it does not cancel anything.
#[derive(Debug)]
pub struct SubmissionHandle {
    id: Uuid,
    task: JoinHandle<SessionState>,
}

impl SubmissionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the terminal state this submission produced
    pub async fn settled(self) -> Result<SessionState, JoinError> {
        self.task.await
    }
}

struct SessionSlot {
    state: SessionState,
    /// Submission the current state belongs to; None when Idle
    submission_id: Option<Uuid>,
    preview: Option<Preview>,
}

struct SessionShared {
    slot: RwLock<SessionSlot>,
    transport: ClassificationTransport,
    catalog: ExampleCatalog,
    warmup: WarmupStatus,
    event_bus: EventBus,
}

/// Cloneable handle to the one classification session
#[derive(Clone)]
pub struct ClassificationSession {
    shared: Arc<SessionShared>,
}

impl ClassificationSession {
    pub fn new(transport: ClassificationTransport, catalog: ExampleCatalog, event_bus: EventBus) -> Self {
        Self {
            shared: Arc::new(SessionShared {
                slot: RwLock::new(SessionSlot {
                    state: SessionState::Idle,
                    submission_id: None,
                    preview: None,
                }),
                transport,
                catalog,
                warmup: WarmupStatus::new(),
                event_bus,
            }),
        }
    }

    /// Fire the warmup request; only the first call per session does anything
    pub fn start_warmup(&self) -> Option<JoinHandle<()>> {
        WarmupProber::new(
            self.shared.transport.backend(),
            self.shared.warmup.clone(),
            self.shared.event_bus.clone(),
        )
        .spawn()
    }

    pub fn warmup_status(&self) -> &WarmupStatus {
        &self.shared.warmup
    }

    pub fn is_warmed(&self) -> bool {
        self.shared.warmup.is_warmed()
    }

    /// Copy for the loading indicator
    pub fn loading_message(&self) -> &'static str {
        loading_message(self.is_warmed())
    }

    pub fn catalog(&self) -> &ExampleCatalog {
        &self.shared.catalog
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.shared.event_bus
    }

    pub async fn snapshot(&self) -> SessionState {
        self.shared.slot.read().await.state.clone()
    }

    /// Submit a user-supplied image
    pub async fn submit(&self, submission: ImageSubmission) -> SubmitOutcome {
        let Some(id) = self.begin(None).await else {
            return SubmitOutcome::Rejected;
        };

        let preview_session = self.clone();
        let bytes = submission.bytes().clone();
        let mime_type = submission.mime_type().to_string();
        tokio::spawn(async move {
            if let Some(preview) = decode_preview(bytes, mime_type).await {
                preview_session.attach_preview(id, preview).await;
            }
        });

        let session = self.clone();
        let task = tokio::spawn(async move {
            let outcome = session.classify(submission).await;
            session.finish(id, outcome).await
        });

        SubmitOutcome::Started(SubmissionHandle { id, task })
    }

    /// Submit one of the bundled examples
    ///
    /// Unknown names fail immediately without touching the state. The asset
    /// path itself serves as the preview, so no decode step runs.
    pub async fn submit_example(&self, name: &str) -> Result<SubmitOutcome, CatalogError> {
        let asset: &'static ExampleAsset = self
            .shared
            .catalog
            .find(name)
            .ok_or_else(|| CatalogError::UnknownExample(name.to_string()))?;

        let Some(id) = self.begin(Some(Preview::Asset(asset.path.to_string()))).await else {
            return Ok(SubmitOutcome::Rejected);
        };

        let session = self.clone();
        let task = tokio::spawn(async move {
            let outcome = match session.shared.catalog.resolve(asset).await {
                Ok(submission) => session.classify(submission).await,
                Err(e) => {
                    error!(example = asset.name, "Example image error: {}", e);
                    Err(format!("Failed to load example: {}", e))
                }
            };
            session.finish(id, outcome).await
        });

        Ok(SubmitOutcome::Started(SubmissionHandle { id, task }))
    }

    /// Return to `Idle` from a terminal state
    ///
    /// Returns false (and changes nothing) while a classification is in flight.
    pub async fn clear(&self) -> bool {
        let mut slot = self.shared.slot.write().await;
        if slot.state.is_loading() {
            warn!("Clear ignored: classification in flight");
            return false;
        }

        slot.state = SessionState::Idle;
        slot.submission_id = None;
        slot.preview = None;
        self.publish(None, &slot.state);
        info!("Session cleared");
        true
    }

    async fn classify(&self, submission: ImageSubmission) -> Result<ClassificationResult, String> {
        let payload = normalize(submission);
        self.shared.transport.classify(&payload).await.map_err(|e| {
            error!("Classification error: {}", e);
            failure_message(&e)
        })
    }

    /// Enter `Loading`, or refuse if already there
    async fn begin(&self, preview: Option<Preview>) -> Option<Uuid> {
        let mut slot = self.shared.slot.write().await;
        if slot.state.is_loading() {
            warn!("Submission rejected: classification already in flight");
            return None;
        }

        let id = Uuid::new_v4();
        slot.submission_id = Some(id);
        slot.state = SessionState::Loading {
            preview_available: preview.is_some(),
        };
        slot.preview = preview;

        info!(submission_id = %id, "{}", self.loading_message());
        self.publish(Some(id), &slot.state);
        Some(id)
    }

    async fn attach_preview(&self, id: Uuid, preview: Preview) {
        let mut slot = self.shared.slot.write().await;
        if slot.submission_id != Some(id) {
            // Cleared or superseded before the decode finished
            return;
        }

        slot.preview = Some(preview.clone());
        match &mut slot.state {
            SessionState::Loading { preview_available } => *preview_available = true,
            SessionState::Success { preview: p, .. } | SessionState::Error { preview: p, .. } => {
                *p = Some(preview)
            }
            SessionState::Idle => return,
        }
        self.publish(Some(id), &slot.state);
    }

    /// Leave `Loading` with exactly one of result or error
    async fn finish(&self, id: Uuid, outcome: Result<ClassificationResult, String>) -> SessionState {
        let mut slot = self.shared.slot.write().await;
        if slot.submission_id != Some(id) || !slot.state.is_loading() {
            warn!(submission_id = %id, "Stale submission result discarded");
            return slot.state.clone();
        }

        let preview = slot.preview.clone();
        slot.state = match outcome {
            Ok(result) => SessionState::Success { result, preview },
            Err(message) => SessionState::Error { message, preview },
        };

        info!(submission_id = %id, status = slot.state.status_name(), "Submission settled");
        self.publish(Some(id), &slot.state);
        slot.state.clone()
    }

    fn publish(&self, submission_id: Option<Uuid>, state: &SessionState) {
        self.shared.event_bus.emit_lossy(IfvEvent::SessionStateChanged {
            submission_id,
            state: state.clone(),
            timestamp: chrono::Utc::now(),
        });
    }
}
