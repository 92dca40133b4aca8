//! Event publisher service.
//!
//! Provides an abstraction for publishing real-time notification events.
//! The actual implementation lives in the API layer, which owns the
//! WebSocket connections.

use async_trait::async_trait;
use cohort_common::AppResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A real-time notification event addressed to one room.
///
/// The room is derived from `target_id`: a connection that joined
/// `notification-{target_id}` receives the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub target_id: String,
    pub message: String,
    pub data: serde_json::Value,
}

/// Trait for publishing real-time events.
///
/// This lets the core services publish without depending on the transport.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a notification event. Fire-and-forget: delivery to absent
    /// or slow subscribers is not retried.
    async fn publish_notification(&self, event: NotificationEvent) -> AppResult<()>;
}

/// A no-op implementation for tests or when real-time delivery is disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_notification(&self, _event: NotificationEvent) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for boxed `EventPublisher` trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;
