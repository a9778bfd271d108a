use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{
        cart::CartView,
        orders::{CheckoutRequest, OrderDetails, OrderList, OrderWithItems},
    },
    error::{AppResult, RedirectOnError},
    extract::FormOrJson,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn route() -> Router<AppState> {
    Router::new()
        .route("/", get(list_order))
        .route("/checkout", get(checkout_page).post(checkout))
        .route("/{id}", get(get_order))
}

#[utoipa::path(
    get,
    path = "/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "The user's orders, newest first", body = ApiResponse<OrderList>),
        (status = 401, description = "Not logged in"),
    ),
    tag = "Orders"
)]
pub async fn list_order(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query)
        .await
        .redirect_to("/")?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/orders/checkout",
    responses(
        (status = 200, description = "Cart summary to confirm", body = ApiResponse<CartView>),
        (status = 400, description = "Cart is empty"),
    ),
    tag = "Orders"
)]
pub async fn checkout_page(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = order_service::checkout_summary(&state, &user)
        .await
        .redirect_to("/cart")?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/orders/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order placed", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Empty cart, bad shipping details or insufficient stock"),
    ),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    FormOrJson(payload): FormOrJson<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::checkout(&state, &user, payload)
        .await
        .redirect_to("/orders/checkout")?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with its lines and the user's reviews", body = ApiResponse<OrderDetails>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetails>>> {
    let resp = order_service::get_order(&state, &user, id)
        .await
        .redirect_to("/orders")?;
    Ok(Json(resp))
}
