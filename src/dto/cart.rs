use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

fn one() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    #[serde(alias = "productId")]
    pub product_id: Uuid,
    #[serde(default = "one")]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartRequest {
    pub quantity: i32,
}

/// A cart row with the product fields the cart page shows.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub price: i64,
    pub image: Option<String>,
    pub stock: i32,
    pub quantity: i32,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total: i64,
}

impl CartView {
    pub fn new(items: Vec<CartLine>) -> Self {
        let total = items.iter().map(|line| line.subtotal).sum();
        Self { items, total }
    }
}
