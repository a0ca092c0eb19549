//! Server-Sent Events (SSE) for session updates

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events - SSE event stream
///
/// Streams events:
/// - SessionStateChanged (every transition and late preview)
/// - WarmupCompleted
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    ifv_common::sse::create_event_sse_stream("ifv-client", &state.event_bus)
}
