//! Product forms are multipart, so the CSRF token is checked here once the
//! body has been read rather than by the guard layer.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::HeaderMap,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::products::{AdminProductList, AdminProductView, ProductForm},
    error::{AppResult, RedirectOnError},
    middleware::{auth::AuthAdmin, csrf::verify_submitted},
    models::Product,
    response::ApiResponse,
    services::product_service,
    session::Session,
    state::AppState,
};

const LIST_PAGE: &str = "/admin/products";

/// `body_limit` replaces the 2 MB multipart default so full-size images fit.
pub fn router(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/{id}", get(view_product).post(update_product))
        .route("/{id}/delete", post(delete_product))
        .layer(DefaultBodyLimit::max(body_limit))
}

async fn read_form(session: &Session, headers: &HeaderMap, multipart: Multipart) -> AppResult<ProductForm> {
    let form = ProductForm::from_multipart(multipart).await?;
    verify_submitted(session, headers, form.csrf_token.as_deref())?;
    Ok(form)
}

#[utoipa::path(
    get,
    path = "/admin/products",
    responses(
        (status = 200, description = "All products, newest first", body = ApiResponse<AdminProductList>),
        (status = 401, description = "Admin access required"),
    ),
    tag = "Admin Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    _admin: AuthAdmin,
) -> AppResult<Json<ApiResponse<AdminProductList>>> {
    let resp = product_service::list_products(&state)
        .await
        .redirect_to("/admin/dashboard")?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product with rating and QR number", body = ApiResponse<AdminProductView>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Admin Products"
)]
pub async fn view_product(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<AdminProductView>>> {
    let resp = product_service::view_product(&state, id)
        .await
        .redirect_to(LIST_PAGE)?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/products",
    request_body(content_type = "multipart/form-data", description = "Product form with optional image file"),
    responses(
        (status = 200, description = "Product created", body = ApiResponse<Product>),
        (status = 400, description = "Invalid product"),
        (status = 403, description = "Invalid security token"),
    ),
    tag = "Admin Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    session: Session,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    let form = read_form(&session, &headers, multipart).await?;
    let resp = product_service::create_product(&state, form)
        .await
        .redirect_to(LIST_PAGE)?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body(content_type = "multipart/form-data", description = "Product form with optional image file"),
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 400, description = "Invalid product"),
        (status = 404, description = "Product not found"),
    ),
    tag = "Admin Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    session: Session,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    let form = read_form(&session, &headers, multipart).await?;
    let resp = product_service::update_product(&state, id, form)
        .await
        .redirect_to(format!("{LIST_PAGE}/{id}"))?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/products/{id}/delete",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Admin Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&state, id)
        .await
        .redirect_to(LIST_PAGE)?;
    Ok(Json(resp))
}
