//! WebSocket streaming API.
//!
//! Each connection joins at most one room, named `notification-{id}` after
//! whichever of `userId` / `memberId` / `groupId` the client supplied at
//! connect time. Events published for that id are pushed as they arrive;
//! everything else is filtered out connection-side.

#![allow(missing_docs)]

use async_trait::async_trait;
use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use cohort_common::AppResult;
use cohort_core::{EventPublisher, NotificationEvent};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::middleware::AppState;

/// Streaming query parameters. Exactly one id selects the room.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamQuery {
    pub user_id: Option<String>,
    pub member_id: Option<String>,
    pub group_id: Option<String>,
}

impl StreamQuery {
    /// The room id, taken from the first identifier supplied.
    fn room_target(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .or(self.member_id.as_deref())
            .or(self.group_id.as_deref())
    }
}

/// Server-to-client message.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerMessage<'a> {
    /// Event name, `notification-{id}`.
    event: String,
    /// The notification payload.
    body: &'a NotificationEvent,
}

/// Shared state for streaming.
#[derive(Clone)]
pub struct StreamingState {
    /// Broadcast sender for notification events.
    notification_tx: Arc<broadcast::Sender<NotificationEvent>>,
}

impl StreamingState {
    /// Create a new streaming state.
    #[must_use]
    pub fn new() -> Self {
        let (notification_tx, _) = broadcast::channel(1000);

        Self {
            notification_tx: Arc::new(notification_tx),
        }
    }

    /// Publish a notification event to every connection in its room.
    ///
    /// Fire-and-forget: with no subscribers the event is dropped.
    pub fn publish(&self, event: NotificationEvent) {
        let _ = self.notification_tx.send(event);
    }

    fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.notification_tx.subscribe()
    }
}

impl Default for StreamingState {
    fn default() -> Self {
        Self::new()
    }
}

/// [`EventPublisher`] implementation over the in-process broadcast bus.
#[derive(Clone)]
pub struct BroadcastPublisher {
    streaming: StreamingState,
}

impl BroadcastPublisher {
    /// Wrap a streaming state as an event publisher.
    #[must_use]
    pub const fn new(streaming: StreamingState) -> Self {
        Self { streaming }
    }
}

#[async_trait]
impl EventPublisher for BroadcastPublisher {
    async fn publish_notification(&self, event: NotificationEvent) -> AppResult<()> {
        self.streaming.publish(event);
        Ok(())
    }
}

/// WebSocket handler for streaming.
pub async fn streaming_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, query, state))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, query: StreamQuery, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // A connection without any identifier joins no room. It is logged and
    // left open, not forcibly disconnected.
    let room_target = query.room_target().map(ToString::to_string);
    match &room_target {
        Some(id) => info!(room = %format!("notification-{id}"), "Streaming connection joined room"),
        None => warn!("Streaming connection without userId, memberId, or groupId"),
    }

    let mut notification_rx = state.streaming.subscribe();

    loop {
        tokio::select! {
            // Handle incoming messages from client
            Some(msg) = receiver.next() => {
                match msg {
                    Ok(Message::Close(_)) => {
                        info!("Client closed connection");
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                }
            }

            // Push room events to the client
            Ok(event) = notification_rx.recv() => {
                let Some(ref target) = room_target else { continue };
                if event.target_id != *target {
                    continue;
                }

                let msg = ServerMessage {
                    event: format!("notification-{target}"),
                    body: &event,
                };
                let json = serde_json::to_string(&msg).unwrap_or_default();
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    info!("Streaming connection closed");
}
