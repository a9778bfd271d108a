use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        catalog::{ProductDetails, ProductList, QrProductPage},
        orders::ReviewRequest,
    },
    error::{AppResult, RedirectOnError},
    extract::FormOrJson,
    middleware::auth::AuthUser,
    models::Review,
    response::ApiResponse,
    routes::params::ProductSearchQuery,
    services::{catalog_service, review_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/qrcode/{code}", get(product_by_qr_code))
        .route("/{id}", get(get_product))
        .route("/{id}/review", post(add_review))
}

#[utoipa::path(
    get,
    path = "/products",
    params(ProductSearchQuery),
    responses(
        (status = 200, description = "Products matching the search, newest first", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductSearchQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(catalog_service::list_products(&state, query).await?))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product with reviews and rating", body = ApiResponse<ProductDetails>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductDetails>>> {
    let resp = catalog_service::product_details(&state, id)
        .await
        .redirect_to("/products")?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/products/qrcode/{code}",
    params(("code" = String, Path, description = "QR code number printed on the tag")),
    responses(
        (status = 200, description = "Scanned product", body = ApiResponse<QrProductPage>),
        (status = 404, description = "No product carries this code"),
    ),
    tag = "Products"
)]
pub async fn product_by_qr_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<QrProductPage>>> {
    let resp = catalog_service::product_by_qr_code(&state, &code)
        .await
        .redirect_to("/")?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/products/{id}/review",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review added or replaced", body = ApiResponse<Review>),
        (status = 400, description = "Rating outside 1-5"),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn add_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    FormOrJson(payload): FormOrJson<ReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let back = match payload.order_id {
        Some(order_id) => format!("/orders/{order_id}"),
        None => format!("/products/{id}"),
    };
    let resp = review_service::add_review(&state, &user, id, payload)
        .await
        .redirect_to(back)?;
    Ok(Json(resp))
}
