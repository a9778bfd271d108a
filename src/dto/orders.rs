use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    extract::empty_string_as_none,
    models::{Order, OrderItem},
};

/// Shipping details from the checkout form. Leaving every field out places a
/// `pending` order without shipping details.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShippingDetails {
    pub customer_name: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExistingReview {
    pub rating: i32,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An order line as the order page shows it.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub image: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
    pub has_review: bool,
    pub review: Option<ExistingReview>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewRequest {
    #[serde(default)]
    pub rating: i32,
    pub message: Option<String>,
    /// Set when the review is written from an order page.
    #[serde(default, alias = "orderId", deserialize_with = "empty_string_as_none")]
    #[schema(value_type = Option<String>)]
    pub order_id: Option<Uuid>,
}
