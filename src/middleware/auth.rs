use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::Redirect,
};
use uuid::Uuid;

use crate::{error::AppError, session::Session};

pub const USER_LOGIN: &str = "/auth/login";
pub const ADMIN_LOGIN: &str = "/admin/login";

/// A logged-in shopper.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
}

/// A logged-in back-office administrator.
#[derive(Debug, Clone)]
pub struct AuthAdmin {
    pub admin_id: Uuid,
    pub name: String,
}

/// Only admits visitors without a user login (login and register pages).
#[derive(Debug, Clone, Copy)]
pub struct GuestUser;

/// Only admits visitors without an admin login.
#[derive(Debug, Clone, Copy)]
pub struct GuestAdmin;

fn session_of(parts: &Parts) -> Result<Session, AppError> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("session layer is not installed")))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (user_id, name) = session_of(parts)?.user().ok_or(AppError::Unauthorized {
            message: "Please login to continue",
            login: USER_LOGIN,
        })?;
        Ok(AuthUser { user_id, name })
    }
}

impl<S> FromRequestParts<S> for AuthAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (admin_id, name) = session_of(parts)?.admin().ok_or(AppError::Unauthorized {
            message: "Admin access required",
            login: ADMIN_LOGIN,
        })?;
        Ok(AuthAdmin { admin_id, name })
    }
}

impl<S> FromRequestParts<S> for GuestUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match session_of(parts).ok().and_then(|session| session.user()) {
            Some(_) => Err(Redirect::to("/")),
            None => Ok(GuestUser),
        }
    }
}

impl<S> FromRequestParts<S> for GuestAdmin
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match session_of(parts).ok().and_then(|session| session.admin()) {
            Some(_) => Err(Redirect::to("/admin/dashboard")),
            None => Ok(GuestAdmin),
        }
    }
}
