//! HTTP API layer for cohort.
//!
//! This crate provides the REST API and real-time streaming:
//!
//! - **Endpoints**: per-kind auth, admin group management, the user join
//!   flow, member administration, notification delivery
//! - **Extractors**: typed authenticated principals
//! - **Middleware**: per-scope bearer verification
//! - **Streaming**: WebSocket notification rooms
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod streaming;

pub use endpoints::router;
pub use middleware::AppState;
pub use streaming::{BroadcastPublisher, StreamingState, streaming_handler};
