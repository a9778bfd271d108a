use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    dto::auth::{LoginRequest, RegisterRequest},
    entity::{
        admins::{Column as AdminCol, Entity as Admins},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    models::{Admin, User},
    response::{ApiResponse, Meta},
    session::Session,
    state::AppState,
    validation::{RegistrationInput, normalize_phone, validate_registration},
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password_hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn credentials(payload: &LoginRequest) -> AppResult<(String, &str)> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest("Email and password are required".into()));
    }
    Ok((normalize_email(&payload.email), payload.password.as_str()))
}

pub async fn register_user(
    state: &AppState,
    session: &Session,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let email = normalize_email(&payload.email);
    let errors = validate_registration(&RegistrationInput {
        name: &payload.name,
        email: &email,
        password: &payload.password,
        confirm_password: &payload.confirm_password,
    });
    if let Some(first) = errors.into_iter().next() {
        return Err(AppError::BadRequest(first));
    }

    let phone = match payload.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) => Some(normalize_phone(raw).ok_or_else(|| {
            AppError::BadRequest("Phone number must be 10 digits".into())
        })?),
        None => None,
    };

    let exists = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        phone: Set(phone),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| match err.sql_err() {
        // lost a race with another registration for the same address
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
            AppError::BadRequest("Email already registered".into())
        }
        _ => AppError::OrmError(err),
    })?;

    session.login_user(user.id, &user.name);
    tracing::info!(user_id = %user.id, "user registered");

    Ok(ApiResponse::success("Registration successful!", User::from(user), None).redirect_to("/"))
}

pub async fn login_user(
    state: &AppState,
    session: &Session,
    payload: LoginRequest,
) -> AppResult<ApiResponse<User>> {
    let (email, password) = credentials(&payload)?;

    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_CREDENTIALS.into()))?;

    if !verify_password(&user.password_hash, password)? {
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
    }

    session.login_user(user.id, &user.name);
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(ApiResponse::success("Login successful!", User::from(user), Some(Meta::empty()))
        .redirect_to("/"))
}

pub async fn login_admin(
    state: &AppState,
    session: &Session,
    payload: LoginRequest,
) -> AppResult<ApiResponse<Admin>> {
    let (email, password) = credentials(&payload)?;

    let admin = Admins::find()
        .filter(AdminCol::Email.eq(email))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_CREDENTIALS.into()))?;

    if !verify_password(&admin.password_hash, password)? {
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
    }

    session.login_admin(admin.id, &admin.name);
    tracing::info!(admin_id = %admin.id, "admin logged in");

    Ok(
        ApiResponse::success("Admin login successful!", Admin::from(admin), Some(Meta::empty()))
            .redirect_to("/admin/dashboard"),
    )
}

pub fn logout(session: &Session, redirect: &str) -> ApiResponse<serde_json::Value> {
    session.destroy();
    ApiResponse::success("Logged out", serde_json::json!({}), Some(Meta::empty())).redirect_to(redirect)
}
