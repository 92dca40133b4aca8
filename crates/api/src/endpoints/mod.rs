//! API endpoints.

mod auth;
mod groups;
mod members;
mod notifications;
mod user_groups;
mod users;

use axum::{Router, middleware::from_fn_with_state};
use cohort_db::entities::PrincipalKind;

use crate::middleware::{self, AppState};

/// Create the API router.
///
/// Auth surfaces are mounted per principal kind; protected groups of
/// routes carry their scope's bearer-verification layer.
pub fn router(state: AppState) -> Router {
    let admin_layer = from_fn_with_state(state.clone(), middleware::require_admin);
    let user_layer = from_fn_with_state(state.clone(), middleware::require_user);

    let admin_router = Router::new()
        .nest("/auth", auth::kind_router(PrincipalKind::Admin))
        .nest("/groups", groups::router().route_layer(admin_layer.clone()));

    let members_router = Router::new()
        .nest("/auth", auth::kind_router(PrincipalKind::Member))
        .merge(members::router().route_layer(admin_layer.clone()));

    let users_router = Router::new()
        .nest("/auth", auth::kind_router(PrincipalKind::User))
        .merge(users::public_router())
        .merge(users::self_router().route_layer(user_layer.clone()))
        .merge(users::admin_router().route_layer(admin_layer));

    Router::new()
        .nest("/admin", admin_router)
        .nest("/members", members_router)
        .nest("/users", users_router)
        .nest("/user/groups", user_groups::router().route_layer(user_layer))
        .nest("/notifications", notifications::router())
        .with_state(state)
}
