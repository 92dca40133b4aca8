//! User account endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use cohort_common::AppResult;
use cohort_core::{CreateUserInput, UpdateUserInput};
use cohort_db::entities::user;
use serde::Serialize;

use crate::{
    extractors::{AuthAdmin, AuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// User response without credentials.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub address: Option<String>,
    pub joined_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            phone_number: u.phone_number,
            bio: u.bio,
            address: u.address,
            joined_at: u.joined_at.to_rfc3339(),
        }
    }
}

/// Register a user account.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.create(input).await?;

    Ok(ApiResponse::created("User created successfully", user.into()))
}

/// The authenticated user's own profile.
async fn me(
    AuthUser(user): AuthUser,
    State(_state): State<AppState>,
) -> AppResult<ApiResponse<UserResponse>> {
    Ok(ApiResponse::ok("User retrieved successfully", user.into()))
}

/// Update the authenticated user's own profile.
async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateUserInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state.user_service.update(&user.id, input).await?;

    Ok(ApiResponse::ok("User updated successfully", updated.into()))
}

/// List every user.
async fn list_users(
    AuthAdmin(_admin): AuthAdmin,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let users = state.user_service.list().await?;

    Ok(ApiResponse::ok(
        "Users retrieved successfully",
        users.into_iter().map(Into::into).collect(),
    ))
}

/// Get one user.
async fn get_user(
    AuthAdmin(_admin): AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get(&id).await?;

    Ok(ApiResponse::ok("User retrieved successfully", user.into()))
}

/// Update one user.
async fn update_user(
    AuthAdmin(_admin): AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateUserInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.update(&id, input).await?;

    Ok(ApiResponse::ok("User updated successfully", user.into()))
}

/// Delete one user.
async fn delete_user(
    AuthAdmin(_admin): AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.user_service.delete(&id).await?;

    Ok(ApiResponse::message("User deleted"))
}

/// Routes open to anyone.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/register", post(register))
}

/// Routes for the authenticated user.
pub fn self_router() -> Router<AppState> {
    Router::new().route("/me", get(me).put(update_me))
}

/// Routes for administrators.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route(
            "/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}
