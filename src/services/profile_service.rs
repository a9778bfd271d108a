use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

use crate::{
    dto::profile::{ChangePasswordRequest, ProfileView, UpdateProfileRequest},
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    services::auth_service::{hash_password, verify_password},
    session::Session,
    state::AppState,
    validation::is_valid_password,
};

async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<UserModel> {
    Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

pub async fn show_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<ProfileView>> {
    let model = current_user(state, user).await?;
    let order_count = Orders::find()
        .filter(OrderCol::UserId.eq(model.id))
        .count(&state.orm)
        .await? as i64;

    Ok(ApiResponse::success(
        "Profile",
        ProfileView {
            user: User::from(model),
            order_count,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_profile(
    state: &AppState,
    session: &Session,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let model = current_user(state, user).await?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(ApiResponse::success("Profile updated successfully!", User::from(model), None)
            .redirect_to("/profile"));
    }

    let mut active: UserActive = model.into();
    active.name = Set(name.to_string());
    active.updated_at = Set(Utc::now().into());
    let model = active.update(&state.orm).await?;
    session.set_user_name(&model.name);

    Ok(
        ApiResponse::success("Profile updated successfully!", User::from(model), None)
            .redirect_to("/profile"),
    )
}

fn check_new_password(payload: &ChangePasswordRequest) -> AppResult<()> {
    if payload.current_password.is_empty()
        || payload.new_password.is_empty()
        || payload.confirm_password.is_empty()
    {
        return Err(AppError::BadRequest("All password fields are required".into()));
    }
    if payload.new_password != payload.confirm_password {
        return Err(AppError::BadRequest(
            "New password and confirm password do not match".into(),
        ));
    }
    if !is_valid_password(&payload.new_password) {
        return Err(AppError::BadRequest(
            "Password must be at least 6 characters long".into(),
        ));
    }
    Ok(())
}

pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    check_new_password(&payload)?;

    let model = current_user(state, user).await?;
    if !verify_password(&model.password_hash, &payload.current_password)? {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }

    let mut active: UserActive = model.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;
    tracing::info!(user_id = %user.user_id, "password changed");

    Ok(ApiResponse::success(
        "Password changed successfully!",
        serde_json::json!({}),
        Some(Meta::empty()),
    )
    .redirect_to("/profile"))
}
