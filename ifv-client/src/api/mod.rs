//! HTTP API handlers for ifv-client
//!
//! The presentation boundary: a web UI reads the session snapshot (or the SSE
//! stream) and calls submit/clear. Nothing here mutates state directly.

pub mod health;
pub mod session;
pub mod sse;

pub use health::health_routes;
pub use session::session_routes;
pub use sse::event_stream;
