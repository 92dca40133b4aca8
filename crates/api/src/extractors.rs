//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use cohort_core::Principal;
use cohort_db::entities::{admin, member, user};

/// Authenticated admin extractor.
#[derive(Debug, Clone)]
pub struct AuthAdmin(pub admin::Model);

impl<S> FromRequestParts<S> for AuthAdmin
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Principal>() {
            Some(Principal::Admin(a)) => Ok(Self(a.clone())),
            _ => Err((StatusCode::UNAUTHORIZED, "Unauthorized")),
        }
    }
}

/// Authenticated member extractor.
#[derive(Debug, Clone)]
pub struct AuthMember(pub member::Model);

impl<S> FromRequestParts<S> for AuthMember
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Principal>() {
            Some(Principal::Member(m)) => Ok(Self(m.clone())),
            _ => Err((StatusCode::UNAUTHORIZED, "Unauthorized")),
        }
    }
}

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Principal>() {
            Some(Principal::User(u)) => Ok(Self(u.clone())),
            _ => Err((StatusCode::UNAUTHORIZED, "Unauthorized")),
        }
    }
}

/// Extractor for any authenticated principal.
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Principal);

impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthPrincipal)
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}
