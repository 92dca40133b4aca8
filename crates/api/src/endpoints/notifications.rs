//! Notification delivery endpoints.
//!
//! These are internal-trust surfaces: callers are assumed to sit behind
//! the deployment boundary, as with the notify hooks of the rest of the
//! backend. No bearer verification happens here.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use cohort_common::{AppError, AppResult};
use cohort_core::NotifyChannel;
use cohort_db::entities::notification::{self, NotificationTarget};
use serde::{Deserialize, Serialize};

use crate::{middleware::AppState, response::ApiResponse};

/// Notify request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    pub target_id: String,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Mark-as-read request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub notification_id: String,
}

/// Stored notification response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub target_id: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub is_read: bool,
    pub created_at: String,
}

impl From<notification::Model> for NotificationResponse {
    fn from(n: notification::Model) -> Self {
        Self {
            id: n.id,
            target_id: n.target_id,
            message: n.message,
            data: n.data,
            is_read: n.is_read,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

fn validate(req: &NotifyRequest) -> AppResult<()> {
    if req.target_id.trim().is_empty() || req.message.trim().is_empty() {
        return Err(AppError::BadRequest(
            "targetId and message are required".to_string(),
        ));
    }
    Ok(())
}

/// Deliver a notification to a user's room.
async fn notify_user(
    State(state): State<AppState>,
    Json(req): Json<NotifyRequest>,
) -> AppResult<ApiResponse<()>> {
    validate(&req)?;

    state
        .notification_service
        .notify(&req.target_id, &req.message, req.data, NotifyChannel::User)
        .await;

    Ok(ApiResponse::message("Notification sent successfully"))
}

/// Deliver a notification to a member's room.
async fn notify_member(
    State(state): State<AppState>,
    Json(req): Json<NotifyRequest>,
) -> AppResult<ApiResponse<()>> {
    validate(&req)?;

    state
        .notification_service
        .notify(&req.target_id, &req.message, req.data, NotifyChannel::Member)
        .await;

    Ok(ApiResponse::message("Notification sent to member successfully"))
}

/// A user's stored notifications, newest first.
async fn user_notifications(
    State(state): State<AppState>,
    Path(target_id): Path<String>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let notifications = state
        .notification_service
        .notifications_for(&target_id, NotificationTarget::User)
        .await?;

    Ok(ApiResponse::ok(
        "Notifications fetched successfully",
        notifications.into_iter().map(Into::into).collect(),
    ))
}

/// A member's stored notifications, newest first.
async fn member_notifications(
    State(state): State<AppState>,
    Path(target_id): Path<String>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let notifications = state
        .notification_service
        .notifications_for(&target_id, NotificationTarget::Member)
        .await?;

    Ok(ApiResponse::ok(
        "Notifications fetched successfully",
        notifications.into_iter().map(Into::into).collect(),
    ))
}

/// Mark one stored notification as read.
async fn mark_read(
    State(state): State<AppState>,
    Json(req): Json<MarkReadRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .notification_service
        .mark_as_read(&req.notification_id)
        .await?;

    Ok(ApiResponse::message("Notification marked as read"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(notify_user))
        .route("/member", post(notify_member))
        .route("/member/{target_id}", get(member_notifications))
        .route("/read", post(mark_read))
        .route("/{target_id}", get(user_notifications))
}
