use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartView, UpdateCartRequest},
    error::{AppResult, RedirectOnError},
    extract::FormOrJson,
    middleware::auth::AuthUser,
    models::CartItem,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

const CART_PAGE: &str = "/cart";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list))
        .route("/add", post(add_to_cart))
        .route("/{id}/update", post(update_cart_item))
        .route("/{id}/remove", post(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Cart lines with product details and total", body = ApiResponse<CartView>),
        (status = 401, description = "Not logged in"),
    ),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::get_cart(&state, &user).await.redirect_to("/")?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/cart/add",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Added, or quantity increased", body = ApiResponse<CartItem>),
        (status = 400, description = "Invalid quantity or insufficient stock"),
        (status = 404, description = "Product not found"),
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    FormOrJson(payload): FormOrJson<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let back = format!("/products/{}", payload.product_id);
    let resp = cart_service::add_to_cart(&state, &user, payload)
        .await
        .redirect_to(back)?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/cart/{id}/update",
    params(("id" = Uuid, Path, description = "Cart item ID")),
    request_body = UpdateCartRequest,
    responses(
        (status = 200, description = "Quantity changed", body = ApiResponse<CartItem>),
        (status = 400, description = "Invalid quantity or insufficient stock"),
        (status = 404, description = "Cart item not found"),
    ),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    FormOrJson(payload): FormOrJson<UpdateCartRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let resp = cart_service::update_cart_item(&state, &user, id, payload)
        .await
        .redirect_to(CART_PAGE)?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/cart/{id}/remove",
    params(("id" = Uuid, Path, description = "Cart item ID")),
    responses(
        (status = 200, description = "Removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Cart item not found"),
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::remove_from_cart(&state, &user, id)
        .await
        .redirect_to(CART_PAGE)?;
    Ok(Json(resp))
}
