//! Authentication endpoints, mounted once per principal kind.

use axum::{Json, Router, extract::State, routing::post};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cohort_common::{AppError, AppResult};
use cohort_core::TokenPair;
use cohort_db::entities::PrincipalKind;
use serde::{Deserialize, Serialize};

use crate::middleware::{AppState, access_cookie_name, refresh_cookie_name};
use crate::response::ApiResponse;

/// Login request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Refresh response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

fn auth_cookie(name: &'static str, value: &str) -> Cookie<'static> {
    Cookie::build((name, value.to_string()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

/// Authenticate within one principal namespace and set token cookies.
async fn login(
    kind: PrincipalKind,
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> AppResult<(CookieJar, ApiResponse<TokenPair>)> {
    let pair = state.auth_service.login(kind, &req.email, &req.password).await?;

    let jar = jar
        .add(auth_cookie(access_cookie_name(kind), &pair.access_token))
        .add(auth_cookie(refresh_cookie_name(kind), &pair.refresh_token));

    Ok((jar, ApiResponse::ok("Login successful", pair)))
}

/// Revoke the cookie-held token pair and clear the cookies.
async fn logout(
    kind: PrincipalKind,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<()>)> {
    let access = jar
        .get(access_cookie_name(kind))
        .map(|c| c.value().to_string());
    let refresh = jar
        .get(refresh_cookie_name(kind))
        .map(|c| c.value().to_string());

    let (Some(access), Some(refresh)) = (access, refresh) else {
        return Err(AppError::TokensMissing);
    };

    state.auth_service.logout(kind, &access, &refresh).await?;

    let jar = jar
        .remove(removal_cookie(access_cookie_name(kind)))
        .remove(removal_cookie(refresh_cookie_name(kind)));

    Ok((jar, ApiResponse::message("Logged out successfully. Tokens cleared.")))
}

/// Rotate the access token using the cookie-held refresh token.
async fn refresh(
    kind: PrincipalKind,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<RefreshResponse>)> {
    let access = jar
        .get(access_cookie_name(kind))
        .map(|c| c.value().to_string());
    let refresh = jar
        .get(refresh_cookie_name(kind))
        .map(|c| c.value().to_string());

    let (Some(access), Some(refresh)) = (access, refresh) else {
        return Err(AppError::TokensMissing);
    };

    let outcome = state.auth_service.refresh(kind, &access, &refresh).await?;

    let message = if outcome.rotated {
        "New access token issued successfully"
    } else {
        "Access token is still valid. No need to refresh."
    };

    let jar = jar.add(auth_cookie(access_cookie_name(kind), &outcome.access_token));

    Ok((
        jar,
        ApiResponse::ok(
            message,
            RefreshResponse {
                access_token: outcome.access_token,
            },
        ),
    ))
}

/// Build the auth router for one principal kind.
pub fn kind_router(kind: PrincipalKind) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(move |state: State<AppState>, jar: CookieJar, body: Json<LoginRequest>| {
                login(kind, state, jar, body)
            }),
        )
        .route(
            "/logout",
            post(move |state: State<AppState>, jar: CookieJar| logout(kind, state, jar)),
        )
        .route(
            "/refresh-token",
            post(move |state: State<AppState>, jar: CookieJar| refresh(kind, state, jar)),
        )
}
