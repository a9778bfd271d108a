use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::auth::{FormPage, LoginRequest, RegisterRequest, SessionInfo},
    error::{AppResult, RedirectOnError},
    extract::FormOrJson,
    middleware::{
        auth::{GuestUser, USER_LOGIN},
        csrf::session_token,
    },
    models::User,
    response::ApiResponse,
    services::{auth_service, cart_service::cart_count},
    session::Session,
    state::AppState,
};

const REGISTER_PAGE: &str = "/auth/register";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", post(logout))
}

#[utoipa::path(
    get,
    path = "/auth/register",
    responses(
        (status = 200, description = "Registration form", body = ApiResponse<FormPage>),
        (status = 303, description = "Already logged in"),
    ),
    tag = "Auth"
)]
pub async fn register_form(_guest: GuestUser, session: Session) -> Json<ApiResponse<FormPage>> {
    let page = FormPage {
        title: "Register",
        csrf_token: session_token(&session),
    };
    Json(ApiResponse::success("Register", page, None))
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered and logged in", body = ApiResponse<User>),
        (status = 400, description = "Invalid registration"),
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    _guest: GuestUser,
    session: Session,
    FormOrJson(payload): FormOrJson<RegisterRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::register_user(&state, &session, payload)
        .await
        .redirect_to(REGISTER_PAGE)?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/auth/login",
    responses(
        (status = 200, description = "Login form", body = ApiResponse<FormPage>),
        (status = 303, description = "Already logged in"),
    ),
    tag = "Auth"
)]
pub async fn login_form(_guest: GuestUser, session: Session) -> Json<ApiResponse<FormPage>> {
    let page = FormPage {
        title: "Login",
        csrf_token: session_token(&session),
    };
    Json(ApiResponse::success("Login", page, None))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<User>),
        (status = 400, description = "Invalid credentials"),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    _guest: GuestUser,
    session: Session,
    FormOrJson(payload): FormOrJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::login_user(&state, &session, payload)
        .await
        .redirect_to(USER_LOGIN)?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session ended", body = ApiResponse<serde_json::Value>)
    ),
    tag = "Auth"
)]
pub async fn logout(session: Session) -> Json<ApiResponse<serde_json::Value>> {
    Json(auth_service::logout(&session, "/"))
}

#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Who is logged in, cart size and the form token", body = ApiResponse<SessionInfo>)
    ),
    tag = "Auth"
)]
pub async fn session_info(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<ApiResponse<SessionInfo>>> {
    let user = session.user();
    let cart_count = match &user {
        Some((user_id, _)) => cart_count(&state.pool, *user_id).await?,
        None => 0,
    };

    let info = SessionInfo {
        user_name: user.map(|(_, name)| name),
        admin_name: session.admin().map(|(_, name)| name),
        cart_count,
        csrf_token: session_token(&session),
    };
    Ok(Json(ApiResponse::success("Session", info, None)))
}
