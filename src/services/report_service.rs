//! Back-office dashboard figures. Plain aggregate SQL over the order tables.

use chrono::{Months, Utc};

use crate::{
    db::DbPool,
    dto::admin::{CategoryCount, Dashboard, MonthlyCount, MonthlyRevenue, StatusCount, TopProduct},
    error::AppResult,
    response::ApiResponse,
    state::AppState,
};

const CHART_MONTHS: u32 = 6;
const TOP_PRODUCTS: i64 = 5;

async fn count(pool: &DbPool, sql: &str) -> AppResult<i64> {
    let (count,): (i64,) = sqlx::query_as(sql).fetch_one(pool).await?;
    Ok(count)
}

pub async fn dashboard(state: &AppState) -> AppResult<ApiResponse<Dashboard>> {
    let pool = &state.pool;
    let since = Utc::now()
        .checked_sub_months(Months::new(CHART_MONTHS))
        .unwrap_or_else(Utc::now);

    let product_count = count(pool, "SELECT COUNT(*) FROM products").await?;
    let pending_orders_count =
        count(pool, "SELECT COUNT(*) FROM orders WHERE status = 'pending'").await?;
    let total_orders_count = count(pool, "SELECT COUNT(*) FROM orders").await?;
    let total_revenue = count(
        pool,
        "SELECT COALESCE(SUM(total_amount), 0)::BIGINT FROM orders WHERE status <> 'cancelled'",
    )
    .await?;

    let orders_by_status = sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) AS count FROM orders GROUP BY status ORDER BY status",
    )
    .fetch_all(pool)
    .await?;

    let products_by_category = sqlx::query_as::<_, CategoryCount>(
        "SELECT category, COUNT(*) AS count FROM products GROUP BY category ORDER BY category",
    )
    .fetch_all(pool)
    .await?;

    let orders_by_month = sqlx::query_as::<_, MonthlyCount>(
        r#"
        SELECT TO_CHAR(created_at, 'YYYY-MM') AS month, COUNT(*) AS count
        FROM orders
        WHERE created_at >= $1
        GROUP BY month
        ORDER BY month ASC
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let revenue_by_month = sqlx::query_as::<_, MonthlyRevenue>(
        r#"
        SELECT TO_CHAR(created_at, 'YYYY-MM') AS month,
               COALESCE(SUM(total_amount), 0)::BIGINT AS revenue
        FROM orders
        WHERE created_at >= $1 AND status <> 'cancelled'
        GROUP BY month
        ORDER BY month ASC
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let top_products = sqlx::query_as::<_, TopProduct>(
        r#"
        SELECT p.id, p.title, SUM(oi.quantity)::BIGINT AS total_quantity
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        GROUP BY p.id, p.title
        ORDER BY total_quantity DESC
        LIMIT $1
        "#,
    )
    .bind(TOP_PRODUCTS)
    .fetch_all(pool)
    .await?;

    let data = Dashboard {
        product_count,
        pending_orders_count,
        total_orders_count,
        total_revenue,
        orders_by_status,
        products_by_category,
        orders_by_month,
        revenue_by_month,
        top_products,
    };
    Ok(ApiResponse::success("Dashboard", data, None))
}
