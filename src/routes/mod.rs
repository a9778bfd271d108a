use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::services::ServeDir;

use crate::{
    middleware::csrf::csrf_guard,
    response::{ApiResponse, Meta},
    session::session_layer,
    state::AppState,
};

pub mod admin;
pub mod admin_categories;
pub mod admin_products;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod profile;

/// Every page and API route behind the session and CSRF layers. Transport
/// layers (tracing, body and concurrency limits) are added by the binary.
pub fn create_router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/session", get(auth::session_info))
        .merge(catalog::router())
        .nest("/auth", auth::router())
        .nest("/profile", profile::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::route())
        .nest("/products", products::router())
        .nest("/admin", admin::router(state.config.body_limit_bytes))
        .nest_service("/uploads", uploads)
        .merge(doc::scalar_docs())
        .fallback(not_found)
        // the session must exist before the csrf guard runs
        .layer(from_fn(csrf_guard))
        .layer(from_fn_with_state(state.clone(), session_layer))
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}
