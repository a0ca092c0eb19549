//! Session endpoints: snapshot, submit, examples, clear

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ifv_common::events::SessionState;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::models::{ImageSubmission, UPLOAD_FIELD_NAME};
use crate::services::preview_decoder::sniff_mime;
use crate::services::{ExampleAsset, SubmitOutcome};
use crate::{ApiError, ApiResult, AppState};

/// What a presenter needs to render the current screen
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub warmed: bool,
    /// Copy for the loading indicator
    pub loading_message: &'static str,
}

/// Response to an accepted submission
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub submission_id: Uuid,
    pub session: SessionSnapshot,
}

async fn snapshot(state: &AppState) -> SessionSnapshot {
    SessionSnapshot {
        state: state.session.snapshot().await,
        warmed: state.session.is_warmed(),
        loading_message: state.session.loading_message(),
    }
}

fn accepted(outcome: SubmitOutcome) -> ApiResult<Uuid> {
    match outcome {
        SubmitOutcome::Started(handle) => Ok(handle.id()),
        SubmitOutcome::Rejected => Err(ApiError::Conflict(
            "a classification is already in progress".to_string(),
        )),
    }
}

/// GET /api/session
pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(snapshot(&state).await)
}

/// POST /api/submit
///
/// Multipart upload with the image in the `file` field. Returns 202 once the
/// session is `Loading`; the outcome arrives via `/api/session` or `/events`.
pub async fn submit_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let mut submission = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            continue;
        }

        let declared_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let mime_type = content_type.unwrap_or_else(|| sniff_mime(&bytes).to_string());
        submission = Some(ImageSubmission::new(bytes, declared_name, mime_type));
        break;
    }

    let submission = submission
        .ok_or_else(|| ApiError::BadRequest(format!("missing '{}' field", UPLOAD_FIELD_NAME)))?;

    info!(
        file_name = submission.declared_name(),
        size = submission.bytes().len(),
        "Upload received"
    );

    let submission_id = accepted(state.session.submit(submission).await)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            submission_id,
            session: snapshot(&state).await,
        }),
    ))
}

/// GET /api/examples
pub async fn list_examples(State(state): State<AppState>) -> Json<&'static [ExampleAsset]> {
    Json(state.session.catalog().entries())
}

/// POST /api/examples/:name
pub async fn submit_example(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let submission_id = accepted(state.session.submit_example(&name).await?)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            submission_id,
            session: snapshot(&state).await,
        }),
    ))
}

/// POST /api/clear
pub async fn clear_session(State(state): State<AppState>) -> ApiResult<Json<SessionSnapshot>> {
    if !state.session.clear().await {
        return Err(ApiError::Conflict(
            "cannot clear while a classification is in progress".to_string(),
        ));
    }
    Ok(Json(snapshot(&state).await))
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/submit", post(submit_upload))
        .route("/api/examples", get(list_examples))
        .route("/api/examples/:name", post(submit_example))
        .route("/api/clear", post(clear_session))
}
