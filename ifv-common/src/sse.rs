//! Server-Sent Events (SSE) utilities
//!
//! Bridges the [`EventBus`] to an axum SSE response.

use axum::response::sse::{Event, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::events::{EventBus, IfvEvent};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// One frame of the event stream before it is rendered as SSE
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    /// First frame on every connection
    Connected,
    /// A bus event, named after its variant
    Event { name: &'static str, data: String },
    /// Keepalive comment
    Heartbeat,
}

impl SseFrame {
    fn into_event(self) -> Event {
        match self {
            SseFrame::Connected => Event::default().event("ConnectionStatus").data("connected"),
            SseFrame::Event { name, data } => Event::default().event(name).data(data),
            SseFrame::Heartbeat => Event::default().comment("heartbeat"),
        }
    }
}

/// Frames for one subscriber
///
/// Heartbeats run on a fixed schedule from connection time; forwarded events
/// do not push the next heartbeat back.
pub fn frame_stream(
    service_name: &'static str,
    mut rx: broadcast::Receiver<IfvEvent>,
    heartbeat: Duration,
) -> impl Stream<Item = SseFrame> {
    async_stream::stream! {
        let mut ticker = interval_at(Instant::now() + heartbeat, heartbeat);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        yield SseFrame::Connected;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("SSE: Sending heartbeat");
                    yield SseFrame::Heartbeat;
                }

                received = rx.recv() => {
                    match received {
                        Ok(event) => {
                            let name = event.event_type();
                            match serde_json::to_string(&event) {
                                Ok(data) => {
                                    debug!("SSE: Broadcasting event: {}", name);
                                    yield SseFrame::Event { name, data };
                                }
                                Err(e) => {
                                    warn!("SSE: Failed to serialize event {}: {}", name, e);
                                }
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("SSE: {} client lagged, skipped {} events", service_name, skipped);
                        }
                        Err(RecvError::Closed) => {
                            info!("SSE: {} event bus closed", service_name);
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Create an SSE stream forwarding every event on `event_bus`
///
/// Sends a `ConnectionStatus` event first, then one SSE event per
/// [`IfvEvent`] named after its variant, plus a heartbeat comment every
/// 15 seconds.
///
/// # Example
/// ```rust,ignore
/// pub async fn event_stream(
///     State(state): State<AppState>,
/// ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
///     ifv_common::sse::create_event_sse_stream("ifv-client", &state.event_bus)
/// }
/// ```
pub fn create_event_sse_stream(
    service_name: &'static str,
    event_bus: &EventBus,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = event_bus.subscribe();
    info!(
        subscribers = event_bus.subscriber_count(),
        "New SSE client connected to {} events", service_name
    );

    let stream = frame_stream(service_name, rx, HEARTBEAT_INTERVAL)
        .map(|frame| Ok::<_, Infallible>(frame.into_event()));

    Sse::new(stream)
}
