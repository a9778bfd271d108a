use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        admin::{AdminOrderList, Dashboard, UpdateOrderStatusRequest},
        auth::{FormPage, LoginRequest},
        orders::OrderWithItems,
    },
    error::{AppResult, RedirectOnError},
    extract::FormOrJson,
    middleware::{
        auth::{ADMIN_LOGIN, AuthAdmin, GuestAdmin},
        csrf::session_token,
    },
    models::{Admin, Order},
    response::ApiResponse,
    routes::{admin_categories, admin_products, params::OrderListQuery},
    services::{admin_service, auth_service, report_service},
    session::Session,
    state::AppState,
};

const ORDERS_PAGE: &str = "/admin/orders";

pub fn router(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/login", get(login_form).post(login))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}", get(get_order_admin))
        .route("/orders/{id}/status", post(update_order_status))
        .nest("/products", admin_products::router(body_limit))
        .nest("/categories", admin_categories::router())
}

#[utoipa::path(
    get,
    path = "/admin/login",
    responses(
        (status = 200, description = "Admin login form", body = ApiResponse<FormPage>),
        (status = 303, description = "Already logged in"),
    ),
    tag = "Admin"
)]
pub async fn login_form(_guest: GuestAdmin, session: Session) -> Json<ApiResponse<FormPage>> {
    let page = FormPage {
        title: "Admin Login",
        csrf_token: session_token(&session),
    };
    Json(ApiResponse::success("Admin Login", page, None))
}

#[utoipa::path(
    post,
    path = "/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<Admin>),
        (status = 400, description = "Invalid credentials"),
    ),
    tag = "Admin"
)]
pub async fn login(
    State(state): State<AppState>,
    _guest: GuestAdmin,
    session: Session,
    FormOrJson(payload): FormOrJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<Admin>>> {
    let resp = auth_service::login_admin(&state, &session, payload)
        .await
        .redirect_to(ADMIN_LOGIN)?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/logout",
    responses(
        (status = 200, description = "Session ended", body = ApiResponse<serde_json::Value>)
    ),
    tag = "Admin"
)]
pub async fn logout(session: Session) -> Json<ApiResponse<serde_json::Value>> {
    Json(auth_service::logout(&session, ADMIN_LOGIN))
}

#[utoipa::path(
    get,
    path = "/admin/dashboard",
    responses(
        (status = 200, description = "Store figures and chart series", body = ApiResponse<Dashboard>),
        (status = 401, description = "Admin access required"),
    ),
    tag = "Admin"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AuthAdmin,
) -> AppResult<Json<ApiResponse<Dashboard>>> {
    Ok(Json(report_service::dashboard(&state).await?))
}

#[utoipa::path(
    get,
    path = "/admin/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "All orders with their customers", body = ApiResponse<AdminOrderList>),
        (status = 401, description = "Admin access required"),
    ),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<AdminOrderList>>> {
    let resp = admin_service::list_all_orders(&state, query)
        .await
        .redirect_to("/admin/dashboard")?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = admin_service::get_order_admin(&state, id)
        .await
        .redirect_to(ORDERS_PAGE)?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<Order>),
        (status = 400, description = "Invalid status"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<Uuid>,
    FormOrJson(payload): FormOrJson<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::update_order_status(&state, &admin, id, payload)
        .await
        .redirect_to(ORDERS_PAGE)?;
    Ok(Json(resp))
}
