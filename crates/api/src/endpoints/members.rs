//! Admin-facing member management endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use cohort_common::AppResult;
use cohort_core::{CreateMemberInput, UpdateMemberInput};
use cohort_db::entities::member;
use cohort_db::repositories::MemberSearch;
use serde::Serialize;

use crate::{extractors::AuthAdmin, middleware::AppState, response::ApiResponse};

/// Member response without credentials.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: String,
    pub joined_at: String,
}

impl From<member::Model> for MemberResponse {
    fn from(m: member::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            address: m.address,
            joined_at: m.joined_at.to_rfc3339(),
        }
    }
}

/// Member listing with totals.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberListResponse {
    pub total_count: u64,
    pub members: Vec<MemberResponse>,
}

/// Paged member search response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSearchResponse {
    pub total_count: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub members: Vec<MemberResponse>,
}

/// Create a member account.
async fn create_member(
    AuthAdmin(_admin): AuthAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateMemberInput>,
) -> AppResult<ApiResponse<MemberResponse>> {
    let member = state.member_service.create(input).await?;

    Ok(ApiResponse::created(
        "Member created successfully",
        member.into(),
    ))
}

/// List every member.
async fn list_members(
    AuthAdmin(_admin): AuthAdmin,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MemberListResponse>> {
    let members = state.member_service.list().await?;

    Ok(ApiResponse::ok(
        "Members retrieved successfully",
        MemberListResponse {
            total_count: members.len() as u64,
            members: members.into_iter().map(Into::into).collect(),
        },
    ))
}

/// Get one member.
async fn get_member(
    AuthAdmin(_admin): AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<MemberResponse>> {
    let member = state.member_service.get(&id).await?;

    Ok(ApiResponse::ok("Member retrieved successfully", member.into()))
}

/// Update a member's profile.
async fn update_member(
    AuthAdmin(_admin): AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateMemberInput>,
) -> AppResult<ApiResponse<MemberResponse>> {
    let member = state.member_service.update(&id, input).await?;

    Ok(ApiResponse::ok("Member updated successfully", member.into()))
}

/// Delete a member.
async fn delete_member(
    AuthAdmin(_admin): AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.member_service.delete(&id).await?;

    Ok(ApiResponse::message("Member deleted"))
}

/// Paged search over member names and emails.
async fn search_members(
    AuthAdmin(_admin): AuthAdmin,
    State(state): State<AppState>,
    Json(search): Json<MemberSearch>,
) -> AppResult<ApiResponse<MemberSearchResponse>> {
    let page = state.member_service.search(&search).await?;

    Ok(ApiResponse::ok(
        "Members retrieved successfully",
        MemberSearchResponse {
            total_count: page.total_count,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_count.div_ceil(page.limit.max(1)),
            members: page.members.into_iter().map(Into::into).collect(),
        },
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_member).get(list_members))
        .route("/search", post(search_members))
        .route(
            "/{id}",
            get(get_member).put(update_member).delete(delete_member),
        )
}
