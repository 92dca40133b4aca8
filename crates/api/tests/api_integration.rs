//! API integration tests.
//!
//! These drive the assembled router with mock database connections and
//! assert on status codes, the response envelope, and cookie handling.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use cohort_api::{AppState, StreamingState, router};
use cohort_common::AuthConfig;
use cohort_core::{
    AuthService, GroupService, MemberService, NotificationService, UserService,
};
use cohort_db::entities::{PrincipalKind, access_token, admin, refresh_token};
use cohort_db::repositories::{
    AdminRepository, GroupRepository, MemberRepository, NotificationRepository, TokenRepository,
    UserRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use std::sync::Arc;
use tower::ServiceExt;

fn test_auth_config() -> AuthConfig {
    AuthConfig {
        secret: "integration-test-secret".to_string(),
        access_ttl_secs: 24 * 60 * 60,
        refresh_ttl_secs: 30 * 24 * 60 * 60,
    }
}

fn app_over(db: Arc<DatabaseConnection>) -> Router {
    let admin_repo = AdminRepository::new(Arc::clone(&db));
    let member_repo = MemberRepository::new(Arc::clone(&db));
    let user_repo = UserRepository::new(Arc::clone(&db));
    let token_repo = TokenRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    let auth_service = AuthService::new(
        &test_auth_config(),
        admin_repo,
        member_repo.clone(),
        user_repo.clone(),
        token_repo,
    );
    let notification_service =
        NotificationService::new(notification_repo, group_repo.clone());
    let mut group_service = GroupService::new(group_repo, user_repo.clone());
    group_service.set_notifications(notification_service.clone());

    let state = AppState {
        auth_service,
        group_service,
        member_service: MemberService::new(member_repo),
        user_service: UserService::new(user_repo),
        notification_service,
        streaming: StreamingState::new(),
    };

    router(state)
}

fn empty_app() -> Router {
    app_over(Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
    ))
}

fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

fn seeded_admin(password: &str) -> admin::Model {
    admin::Model {
        id: "adm1".to_string(),
        username: "root".to_string(),
        email: "root@example.com".to_string(),
        password_hash: hash(password),
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn token_row(token: &str) -> access_token::Model {
    access_token::Model {
        id: "tok1".to_string(),
        principal_id: "adm1".to_string(),
        principal_kind: PrincipalKind::Admin,
        token: token.to_string(),
        issued_at: Utc::now().into(),
        expires_at: (Utc::now() + Duration::days(1)).into(),
    }
}

fn refresh_row(token: &str) -> refresh_token::Model {
    refresh_token::Model {
        id: "tok2".to_string(),
        principal_id: "adm1".to_string(),
        principal_kind: PrincipalKind::Admin,
        token: token.to_string(),
        issued_at: Utc::now().into(),
        expires_at: (Utc::now() + Duration::days(30)).into(),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_protected_route_requires_bearer() {
    let app = empty_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/admin/groups")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_admin_login_sets_namespaced_cookies() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[seeded_admin("hunter2hunter2")]])
            .append_query_results([[token_row("ignored-access")]])
            .append_query_results([[refresh_row("ignored-refresh")]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection(),
    );
    let app = app_over(db);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"email":"root@example.com","password":"hunter2hunter2"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();

    assert!(cookies.iter().any(|c| c.starts_with("admin_token=")));
    assert!(cookies.iter().any(|c| c.starts_with("admin_refresh_token=")));

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["principalId"], "adm1");
    assert!(json["data"]["accessToken"].as_str().is_some());
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[seeded_admin("correct-password")]])
            .into_connection(),
    );
    let app = app_over(db);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"email":"root@example.com","password":"wrong"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_logout_without_cookies_is_tokens_missing() {
    let app = empty_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKENS_MISSING");
}

#[tokio::test]
async fn test_notify_requires_target_and_message() {
    let app = empty_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/notifications")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"targetId":"usr1","message":""}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let app = empty_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"username":"ada","email":"not-an-email","password":"password123","firstName":"Ada","lastName":"Lovelace"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_user_token_rejected_on_admin_route() {
    // A structurally valid user token must never satisfy an admin route;
    // verification fails before any database lookup happens.
    let app = empty_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/admin/groups")
                .header(header::AUTHORIZATION, "Bearer not-even-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
