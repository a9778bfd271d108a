use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Category, Product, RatedProduct};

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

/// First page of `/collections` or `/catalog`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogPage {
    pub products: Vec<RatedProduct>,
    pub categories: Vec<String>,
    pub selected_categories: Vec<String>,
    pub search_query: String,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort_by: String,
    pub sort_order: String,
    pub price_range: PriceRange,
    pub has_more: bool,
    pub total_products: i64,
}

/// Infinite-scroll payload. Field names are what the storefront script reads.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadMoreResponse {
    pub success: bool,
    pub products: Vec<RatedProduct>,
    pub has_more: bool,
    pub total: i64,
    /// Offset to request next.
    pub offset: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HomePage {
    pub products: Vec<RatedProduct>,
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
    pub categories: Vec<String>,
    pub selected_category: String,
    pub search_query: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductReview {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub rating: i32,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetails {
    pub product: Product,
    pub reviews: Vec<ProductReview>,
    pub avg_rating: f64,
    pub total_ratings: i64,
}

/// Landing page for a scanned product QR code.
#[derive(Debug, Serialize, ToSchema)]
pub struct QrProductPage {
    pub product: Product,
    pub qr_code_number: Option<String>,
    pub reviews: Vec<ProductReview>,
    pub avg_rating: f64,
    pub total_ratings: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActiveCategories {
    pub categories: Vec<Category>,
}
