//! User-facing group endpoints: browse, request to join, see approvals.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use cohort_common::AppResult;
use cohort_core::AvailableGroup;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Join request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupRequest {
    pub group_id: String,
}

/// An approved group, as the user sees it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedGroup {
    pub group_id: String,
    pub group_name: String,
}

/// List every group with its occupancy.
async fn available_groups(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<AvailableGroup>>> {
    let groups = state.group_service.list_available().await?;

    Ok(ApiResponse::ok("Groups retrieved successfully", groups))
}

/// File a join request for the authenticated user.
async fn request_join(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<JoinGroupRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .group_service
        .request_join(&user.id, &body.group_id)
        .await?;

    Ok(ApiResponse::message("Join request sent successfully"))
}

/// The groups the user has been approved into.
async fn approved_groups(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ApprovedGroup>>> {
    let groups = state.group_service.approved_groups(&user.id).await?;

    let message = if groups.is_empty() {
        "Your group approval is pending"
    } else {
        "Approved groups retrieved successfully"
    };

    let approved = groups
        .into_iter()
        .map(|g| ApprovedGroup {
            group_id: g.id,
            group_name: g.name,
        })
        .collect();

    Ok(ApiResponse::ok(message, approved))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(available_groups))
        .route("/request", post(request_join))
        .route("/approved", get(approved_groups))
}
