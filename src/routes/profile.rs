use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::profile::{ChangePasswordRequest, ProfileView, UpdateProfileRequest},
    error::{AppResult, RedirectOnError},
    extract::FormOrJson,
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::profile_service,
    session::Session,
    state::AppState,
};

const PROFILE_PAGE: &str = "/profile";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show_profile).post(update_profile))
        .route("/password", post(change_password))
}

#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Current user and order count", body = ApiResponse<ProfileView>),
        (status = 401, description = "Not logged in"),
    ),
    tag = "Profile"
)]
pub async fn show_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ProfileView>>> {
    let resp = profile_service::show_profile(&state, &user)
        .await
        .redirect_to("/")?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Name updated", body = ApiResponse<User>),
        (status = 400, description = "Invalid name"),
    ),
    tag = "Profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    session: Session,
    FormOrJson(payload): FormOrJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = profile_service::update_profile(&state, &session, &user, payload)
        .await
        .redirect_to(PROFILE_PAGE)?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/profile/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Rejected password change"),
    ),
    tag = "Profile"
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    FormOrJson(payload): FormOrJson<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = profile_service::change_password(&state, &user, payload)
        .await
        .redirect_to(PROFILE_PAGE)?;
    Ok(Json(resp))
}
