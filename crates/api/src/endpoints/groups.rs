//! Admin group management endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post, put},
};
use cohort_common::{AppError, AppResult};
use cohort_core::{
    CreateGroupInput, GroupBroadcastLog, GroupWithMembers, JoinRequestDetail, ResolveAction,
    UpdateGroupInput,
};
use cohort_db::entities::{group, join_request};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthAdmin, middleware::AppState, response::ApiResponse};

/// Group response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub max_users: i32,
    pub created_by: String,
    pub created_at: String,
}

impl From<group::Model> for GroupResponse {
    fn from(g: group::Model) -> Self {
        Self {
            id: g.id,
            name: g.name,
            max_users: g.max_users,
            created_by: g.created_by,
            created_at: g.created_at.to_rfc3339(),
        }
    }
}

/// Join request response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequestResponse {
    pub id: String,
    pub group_id: String,
    pub user_id: String,
    pub status: String,
}

impl From<join_request::Model> for JoinRequestResponse {
    fn from(r: join_request::Model) -> Self {
        Self {
            id: r.id,
            group_id: r.group_id,
            user_id: r.user_id,
            status: format!("{:?}", r.status).to_lowercase(),
        }
    }
}

/// Resolve request body.
///
/// The action is matched by hand so an unknown verb comes back as a 400
/// rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequestBody {
    pub action: String,
}

fn parse_action(action: &str) -> AppResult<ResolveAction> {
    match action {
        "approve" => Ok(ResolveAction::Approve),
        "reject" => Ok(ResolveAction::Reject),
        other => Err(AppError::BadRequest(format!("Invalid action: {other}"))),
    }
}

/// Broadcast request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    pub message: String,
}

/// Broadcast response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResponse {
    pub notified: usize,
}

/// Create a new group.
async fn create_group(
    AuthAdmin(admin): AuthAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateGroupInput>,
) -> AppResult<ApiResponse<GroupResponse>> {
    let group = state.group_service.create(&admin.id, input).await?;

    Ok(ApiResponse::created(
        "Group created successfully",
        group.into(),
    ))
}

/// List the admin's groups with member profiles.
async fn list_groups(
    AuthAdmin(admin): AuthAdmin,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<GroupWithMembers>>> {
    let groups = state.group_service.list_with_members(&admin.id).await?;

    Ok(ApiResponse::ok("Groups fetched successfully", groups))
}

/// Update a group's name or capacity.
async fn update_group(
    AuthAdmin(admin): AuthAdmin,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(input): Json<UpdateGroupInput>,
) -> AppResult<ApiResponse<GroupResponse>> {
    let group = state
        .group_service
        .update(&admin.id, &group_id, input)
        .await?;

    Ok(ApiResponse::ok("Group updated successfully", group.into()))
}

/// Delete a group and everything referencing it.
async fn delete_group(
    AuthAdmin(admin): AuthAdmin,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.group_service.delete(&admin.id, &group_id).await?;

    Ok(ApiResponse::message("Group and related requests deleted"))
}

/// List pending join requests across the admin's groups.
async fn list_join_requests(
    AuthAdmin(admin): AuthAdmin,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<JoinRequestDetail>>> {
    let requests = state.group_service.pending_requests(&admin.id).await?;

    Ok(ApiResponse::ok("Join requests fetched successfully", requests))
}

/// Approve or reject a pending join request.
async fn resolve_request(
    AuthAdmin(_admin): AuthAdmin,
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Json(body): Json<ResolveRequestBody>,
) -> AppResult<ApiResponse<JoinRequestResponse>> {
    let action = parse_action(&body.action)?;
    let request = state.group_service.resolve(&request_id, action).await?;

    let message = match action {
        ResolveAction::Approve => "Request approved successfully",
        ResolveAction::Reject => "Request rejected successfully",
    };

    Ok(ApiResponse::ok(message, request.into()))
}

/// Broadcast a message to one group's members.
async fn notify_group(
    AuthAdmin(admin): AuthAdmin,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(body): Json<BroadcastRequest>,
) -> AppResult<ApiResponse<BroadcastResponse>> {
    let notified = state
        .notification_service
        .notify_group(&admin.id, &group_id, &body.message)
        .await?;

    Ok(ApiResponse::ok(
        format!("Notification sent to {notified} members"),
        BroadcastResponse { notified },
    ))
}

/// Broadcast a message to every group the admin owns.
async fn notify_all_groups(
    AuthAdmin(admin): AuthAdmin,
    State(state): State<AppState>,
    Json(body): Json<BroadcastRequest>,
) -> AppResult<ApiResponse<BroadcastResponse>> {
    let notified = state
        .notification_service
        .notify_all_groups(&admin.id, &body.message)
        .await?;

    Ok(ApiResponse::ok(
        format!("Notification sent to {notified} members across your groups"),
        BroadcastResponse { notified },
    ))
}

/// The broadcast history of the admin's groups.
async fn group_notifications(
    AuthAdmin(admin): AuthAdmin,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<GroupBroadcastLog>>> {
    let logs = state
        .notification_service
        .group_broadcast_logs(&admin.id)
        .await?;

    Ok(ApiResponse::ok("Group notifications fetched", logs))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_group).get(list_groups))
        .route("/requests", get(list_join_requests))
        .route("/requests/{request_id}", patch(resolve_request))
        .route("/notify", post(notify_all_groups))
        .route("/notifications", get(group_notifications))
        .route("/{group_id}", put(update_group).delete(delete_group))
        .route("/{group_id}/notify", post(notify_group))
}
