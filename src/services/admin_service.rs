use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use sea_orm::ActiveValue::Set;
use uuid::Uuid;

use crate::{
    dto::{
        admin::{AdminOrderList, AdminOrderRow, UpdateOrderStatusRequest},
        orders::OrderWithItems,
    },
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Entity as Orders},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthAdmin,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_service::ORDER_STATUSES,
    state::AppState,
};

pub fn validate_order_status(status: &str) -> AppResult<()> {
    if ORDER_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid status".into()))
    }
}

/// Every customer's orders, newest first, with the customer's name and email.
pub async fn list_all_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<AdminOrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let status = query.status_filter().map(str::to_string);

    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM orders WHERE ($1::TEXT IS NULL OR status = $1)",
    )
    .bind(status.as_deref())
    .fetch_one(&state.pool)
    .await?;

    let items = sqlx::query_as::<_, AdminOrderRow>(
        r#"
        SELECT o.id, o.user_id, u.name AS user_name, u.email AS user_email,
               o.total_amount, o.status, o.customer_name, o.customer_phone,
               o.city, o.created_at
        FROM orders o
        JOIN users u ON u.id = o.user_id
        WHERE ($1::TEXT IS NULL OR o.status = $1)
        ORDER BY o.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(status.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", AdminOrderList { items }, Some(meta)))
}

pub async fn get_order_admin(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Order::from)
        .ok_or_else(|| AppError::not_found("Order"))?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(ApiResponse::success(
        "Order found",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    admin: &AuthAdmin,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let status = payload.status.trim().to_string();
    validate_order_status(&status)?;

    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let mut active: OrderActive = existing.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    tracing::info!(
        order_id = %order.id,
        status = %order.status,
        admin_id = %admin.admin_id,
        "order status updated"
    );

    Ok(ApiResponse::success("Order status updated!", Order::from(order), None)
        .redirect_to("/admin/orders"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_known_statuses_are_accepted() {
        for status in ORDER_STATUSES {
            assert!(validate_order_status(status).is_ok());
        }
        let err = validate_order_status("refunded").unwrap_err();
        assert_eq!(err.to_string(), "Invalid status");
        assert!(validate_order_status("Shipped").is_err());
    }
}
