use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::categories::{CategoryList, CategoryRequest},
    error::{AppResult, RedirectOnError},
    extract::FormOrJson,
    middleware::auth::AuthAdmin,
    models::Category,
    response::ApiResponse,
    services::category_service,
    state::AppState,
};

const LIST_PAGE: &str = "/admin/categories";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/{id}", get(get_category).post(update_category))
        .route("/{id}/delete", post(delete_category))
}

#[utoipa::path(
    get,
    path = "/admin/categories",
    responses(
        (status = 200, description = "Categories with product counts", body = ApiResponse<CategoryList>),
        (status = 401, description = "Admin access required"),
    ),
    tag = "Admin Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    _admin: AuthAdmin,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = category_service::list_categories(&state)
        .await
        .redirect_to("/admin/dashboard")?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category for the edit form", body = ApiResponse<Category>),
        (status = 404, description = "Category not found"),
    ),
    tag = "Admin Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::get_category(&state, id)
        .await
        .redirect_to(LIST_PAGE)?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/categories",
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category created", body = ApiResponse<Category>),
        (status = 400, description = "Missing or duplicate name"),
    ),
    tag = "Admin Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    FormOrJson(payload): FormOrJson<CategoryRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::create_category(&state, payload)
        .await
        .redirect_to(LIST_PAGE)?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<Category>),
        (status = 400, description = "Missing or duplicate name"),
        (status = 404, description = "Category not found"),
    ),
    tag = "Admin Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
    FormOrJson(payload): FormOrJson<CategoryRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::update_category(&state, id, payload)
        .await
        .redirect_to(format!("{LIST_PAGE}/{id}"))?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/categories/{id}/delete",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Category still has products"),
        (status = 404, description = "Category not found"),
    ),
    tag = "Admin Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = category_service::delete_category(&state, id)
        .await
        .redirect_to(LIST_PAGE)?;
    Ok(Json(resp))
}
