//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use cohort_common::AppError;
use cohort_core::{
    AuthScope, AuthService, GroupService, MemberService, NotificationService, UserService,
};
use cohort_db::entities::PrincipalKind;

use crate::streaming::StreamingState;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub group_service: GroupService,
    pub member_service: MemberService,
    pub user_service: UserService,
    pub notification_service: NotificationService,
    pub streaming: StreamingState,
}

/// Access-token cookie name for a principal kind.
///
/// Cookie names are namespaced per kind so concurrent sessions of
/// different kinds in one browser never clobber each other.
#[must_use]
pub const fn access_cookie_name(kind: PrincipalKind) -> &'static str {
    match kind {
        PrincipalKind::Admin => "admin_token",
        PrincipalKind::Member => "member_token",
        PrincipalKind::User => "user_token",
    }
}

/// Refresh-token cookie name for a principal kind.
#[must_use]
pub const fn refresh_cookie_name(kind: PrincipalKind) -> &'static str {
    match kind {
        PrincipalKind::Admin => "admin_refresh_token",
        PrincipalKind::Member => "member_refresh_token",
        PrincipalKind::User => "user_refresh_token",
    }
}

/// Cookie names a scope may read an access token from.
const fn cookie_candidates(scope: AuthScope) -> &'static [PrincipalKind] {
    match scope {
        AuthScope::Admin => &[PrincipalKind::Admin],
        AuthScope::Member => &[PrincipalKind::Member],
        AuthScope::User => &[PrincipalKind::User],
        AuthScope::Any => &[PrincipalKind::Admin, PrincipalKind::Member, PrincipalKind::User],
    }
}

/// Pull the bearer token from the Authorization header, falling back to
/// the scope's access cookie.
fn bearer_from(req: &Request<Body>, scope: AuthScope) -> Option<String> {
    if let Some(auth_header) = req.headers().get(AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.to_string());
    }

    let jar = CookieJar::from_headers(req.headers());
    for kind in cookie_candidates(scope) {
        if let Some(cookie) = jar.get(access_cookie_name(*kind)) {
            return Some(cookie.value().to_string());
        }
    }

    None
}

/// Verify the bearer for `scope` and attach the principal to the request.
async fn run_auth(scope: AuthScope, state: AppState, mut req: Request<Body>, next: Next) -> Response {
    let Some(token) = bearer_from(&req, scope) else {
        return AppError::Unauthorized.into_response();
    };

    match state.auth_service.verify_bearer(scope, &token).await {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// Admin-only bearer verification middleware.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    run_auth(AuthScope::Admin, state, req, next).await
}

/// Member-only bearer verification middleware.
pub async fn require_member(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    run_auth(AuthScope::Member, state, req, next).await
}

/// User-only bearer verification middleware.
pub async fn require_user(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    run_auth(AuthScope::User, state, req, next).await
}

/// Any-principal bearer verification middleware.
pub async fn require_any(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    run_auth(AuthScope::Any, state, req, next).await
}
