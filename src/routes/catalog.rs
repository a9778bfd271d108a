use axum::{
    Json, Router,
    extract::{RawQuery, State},
    routing::get,
};

use crate::{
    dto::catalog::{ActiveCategories, CatalogPage, HomePage, LoadMoreResponse},
    error::AppResult,
    response::ApiResponse,
    routes::params::{CatalogParams, Listing},
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/collections", get(collections))
        .route("/catalog", get(catalog))
        .route("/api/collections", get(more_collections))
        .route("/api/catalog", get(more_catalog))
        .route("/api/categories", get(categories))
}

fn params(query: Option<String>) -> CatalogParams {
    CatalogParams::from_query_str(query.as_deref().unwrap_or_default())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Newest products and product categories", body = ApiResponse<HomePage>)
    ),
    tag = "Catalog"
)]
pub async fn home(State(state): State<AppState>) -> AppResult<Json<ApiResponse<HomePage>>> {
    Ok(Json(catalog_service::home_page(&state).await?))
}

#[utoipa::path(
    get,
    path = "/collections",
    params(
        ("search" = Option<String>, Query, description = "Matches title, description or category"),
        ("categories" = Option<Vec<String>>, Query, description = "Category names, may repeat"),
        ("minPrice" = Option<i64>, Query, description = "Lowest price"),
        ("maxPrice" = Option<i64>, Query, description = "Highest price"),
        ("sortBy" = Option<String>, Query, description = "created_at, price or title; default created_at"),
        ("sortOrder" = Option<String>, Query, description = "asc or desc; default desc"),
    ),
    responses(
        (status = 200, description = "First page of the collections listing", body = ApiResponse<CatalogPage>)
    ),
    tag = "Catalog"
)]
pub async fn collections(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> AppResult<Json<ApiResponse<CatalogPage>>> {
    let page = catalog_service::catalog_page(&state, params(query), Listing::Collections).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/catalog",
    params(
        ("search" = Option<String>, Query, description = "Matches title, description or category"),
        ("categories" = Option<Vec<String>>, Query, description = "Category names, may repeat"),
        ("minPrice" = Option<i64>, Query, description = "Lowest price"),
        ("maxPrice" = Option<i64>, Query, description = "Highest price"),
        ("sortBy" = Option<String>, Query, description = "created_at, price or title; default title"),
        ("sortOrder" = Option<String>, Query, description = "asc or desc; default asc"),
    ),
    responses(
        (status = 200, description = "First page of the catalog listing", body = ApiResponse<CatalogPage>)
    ),
    tag = "Catalog"
)]
pub async fn catalog(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> AppResult<Json<ApiResponse<CatalogPage>>> {
    let page = catalog_service::catalog_page(&state, params(query), Listing::Catalog).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/collections",
    params(
        ("limit" = Option<i64>, Query, description = "Page size, default 20"),
        ("offset" = Option<i64>, Query, description = "Rows to skip"),
    ),
    responses(
        (status = 200, description = "Next slice of the collections listing", body = LoadMoreResponse)
    ),
    tag = "Catalog"
)]
pub async fn more_collections(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> AppResult<Json<LoadMoreResponse>> {
    let more = catalog_service::load_more(&state, params(query), Listing::Collections).await?;
    Ok(Json(more))
}

#[utoipa::path(
    get,
    path = "/api/catalog",
    params(
        ("limit" = Option<i64>, Query, description = "Page size, default 20"),
        ("offset" = Option<i64>, Query, description = "Rows to skip"),
    ),
    responses(
        (status = 200, description = "Next slice of the catalog listing", body = LoadMoreResponse)
    ),
    tag = "Catalog"
)]
pub async fn more_catalog(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> AppResult<Json<LoadMoreResponse>> {
    let more = catalog_service::load_more(&state, params(query), Listing::Catalog).await?;
    Ok(Json(more))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Active categories in display order", body = ApiResponse<ActiveCategories>)
    ),
    tag = "Catalog"
)]
pub async fn categories(State(state): State<AppState>) -> AppResult<Json<ApiResponse<ActiveCategories>>> {
    Ok(Json(catalog_service::active_categories(&state).await?))
}
