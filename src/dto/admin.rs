use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    #[serde(default)]
    pub status: String,
}

/// Order row in the back-office list, with the customer it belongs to.
#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct AdminOrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub total_amount: i64,
    pub status: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminOrderList {
    pub items: Vec<AdminOrderRow>,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// Months are `YYYY-MM`.
#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct MonthlyCount {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: i64,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct TopProduct {
    pub id: Uuid,
    pub title: String,
    pub total_quantity: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    pub product_count: i64,
    pub pending_orders_count: i64,
    pub total_orders_count: i64,
    pub total_revenue: i64,
    pub orders_by_status: Vec<StatusCount>,
    pub products_by_category: Vec<CategoryCount>,
    pub orders_by_month: Vec<MonthlyCount>,
    pub revenue_by_month: Vec<MonthlyRevenue>,
    pub top_products: Vec<TopProduct>,
}
