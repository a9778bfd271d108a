use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;

use crate::{
    dto::{
        cart::CartView,
        orders::{
            CheckoutRequest, ExistingReview, OrderDetails, OrderLine, OrderList, OrderWithItems,
            ShippingDetails,
        },
    },
    entity::{
        cart_items::{self, Column as CartCol, Entity as CartItems},
        order_items::{self, ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
        reviews::{Column as ReviewCol, Entity as Reviews},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::cart_service::cart_lines,
    state::AppState,
    validation::{is_valid_pincode, normalize_phone},
};

pub const ORDER_STATUSES: [&str; 5] = ["pending", "processing", "shipped", "delivered", "cancelled"];

fn filled(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate the shipping part of the checkout form. `None` means the form
/// carried no shipping fields at all.
pub fn shipping_details(payload: &CheckoutRequest) -> AppResult<Option<ShippingDetails>> {
    let fields = [
        filled(&payload.customer_name),
        filled(&payload.customer_phone),
        filled(&payload.shipping_address),
        filled(&payload.city),
        filled(&payload.state),
        filled(&payload.pincode),
    ];
    if fields.iter().all(Option::is_none) {
        return Ok(None);
    }

    let [Some(name), Some(phone), Some(address), Some(city), Some(state), Some(pincode)] = fields
    else {
        return Err(AppError::BadRequest("All shipping details are required".into()));
    };

    let phone = normalize_phone(&phone)
        .ok_or_else(|| AppError::BadRequest("Phone number must be 10 digits".into()))?;
    if !is_valid_pincode(&pincode) {
        return Err(AppError::BadRequest("Pincode must be 6 digits".into()));
    }

    Ok(Some(ShippingDetails {
        customer_name: name,
        customer_phone: phone,
        shipping_address: address,
        city,
        state,
        pincode,
    }))
}

pub async fn checkout_summary(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let items = cart_lines(&state.orm, user.user_id).await?;
    if items.is_empty() {
        return Err(AppError::EmptyCart);
    }
    Ok(ApiResponse::success("Checkout", CartView::new(items), Some(Meta::empty())))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status_filter() {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

#[derive(Debug, FromQueryResult)]
struct CheckoutRow {
    product_id: Uuid,
    quantity: i32,
    title: String,
    price: i64,
    stock: i32,
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let shipping = shipping_details(&payload)?;

    // dropping the transaction without commit rolls everything back
    let txn = state.orm.begin().await?;

    let rows = CartItems::find()
        .select_only()
        .column(CartCol::ProductId)
        .column(CartCol::Quantity)
        .column(ProdCol::Title)
        .column(ProdCol::Price)
        .column(ProdCol::Stock)
        .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
        .filter(CartCol::UserId.eq(user.user_id))
        // fixed lock order so concurrent checkouts cannot deadlock
        .order_by_asc(CartCol::ProductId)
        .lock(LockType::Update)
        .into_model::<CheckoutRow>()
        .all(&txn)
        .await?;

    if rows.is_empty() {
        return Err(AppError::EmptyCart);
    }

    if let Some(short) = rows.iter().find(|row| row.stock < row.quantity) {
        return Err(AppError::InsufficientStock(short.title.clone()));
    }

    let total_amount: i64 = rows
        .iter()
        .map(|row| row.price * i64::from(row.quantity))
        .sum();

    let status = if shipping.is_some() { "processing" } else { "pending" };
    let shipping = shipping.map_or_else(
        || (None, None, None, None, None, None),
        |s| {
            (
                Some(s.customer_name),
                Some(s.customer_phone),
                Some(s.shipping_address),
                Some(s.city),
                Some(s.state),
                Some(s.pincode),
            )
        },
    );

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        total_amount: Set(total_amount),
        status: Set(status.into()),
        customer_name: Set(shipping.0),
        customer_phone: Set(shipping.1),
        shipping_address: Set(shipping.2),
        city: Set(shipping.3),
        state: Set(shipping.4),
        pincode: Set(shipping.5),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::with_capacity(rows.len());

    for row in &rows {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(row.product_id),
            quantity: Set(row.quantity),
            unit_price: Set(row.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        order_items.push(OrderItem::from(item));

        // conditional decrement, stock never goes below zero
        let result = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(row.quantity))
            .filter(ProdCol::Id.eq(row.product_id))
            .filter(ProdCol::Stock.gte(row.quantity))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::InsufficientStock(row.title.clone()));
        }
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        total_amount,
        items = order_items.len(),
        "order placed"
    );

    let redirect = format!("/orders/{}", order.id);
    Ok(ApiResponse::success(
        "Order placed successfully!",
        OrderWithItems {
            order: Order::from(order),
            items: order_items,
        },
        Some(Meta::empty()),
    )
    .redirect_to(redirect))
}

#[derive(Debug, FromQueryResult)]
struct OrderLineRow {
    id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_price: i64,
    title: String,
    image: Option<String>,
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetails>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let rows = OrderItems::find()
        .select_only()
        .column(OrderItemCol::Id)
        .column(OrderItemCol::ProductId)
        .column(OrderItemCol::Quantity)
        .column(OrderItemCol::UnitPrice)
        .column(ProdCol::Title)
        .column(ProdCol::Image)
        .join(JoinType::InnerJoin, order_items::Relation::Products.def())
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .into_model::<OrderLineRow>()
        .all(&state.orm)
        .await?;

    let product_ids: Vec<Uuid> = rows.iter().map(|row| row.product_id).collect();
    let reviews: HashMap<Uuid, ExistingReview> = Reviews::find()
        .filter(ReviewCol::UserId.eq(user.user_id))
        .filter(ReviewCol::ProductId.is_in(product_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|review| {
            (
                review.product_id,
                ExistingReview {
                    rating: review.rating,
                    message: review.message,
                    created_at: review.created_at.with_timezone(&chrono::Utc),
                },
            )
        })
        .collect();

    let items = rows
        .into_iter()
        .map(|row| {
            let review = reviews.get(&row.product_id).cloned();
            OrderLine {
                id: row.id,
                product_id: row.product_id,
                title: row.title,
                image: row.image,
                quantity: row.quantity,
                unit_price: row.unit_price,
                has_review: review.is_some(),
                review,
            }
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderDetails {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_form() -> CheckoutRequest {
        CheckoutRequest {
            customer_name: Some("Asha Rao".into()),
            customer_phone: Some("98765-43210".into()),
            shipping_address: Some("12 MG Road".into()),
            city: Some("Bengaluru".into()),
            state: Some("Karnataka".into()),
            pincode: Some("560001".into()),
        }
    }

    #[test]
    fn blank_form_is_the_legacy_checkout() {
        assert_eq!(shipping_details(&CheckoutRequest::default()).unwrap(), None);
    }

    #[test]
    fn complete_form_normalizes_phone() {
        let details = shipping_details(&full_form()).unwrap().unwrap();
        assert_eq!(details.customer_phone, "+919876543210");
        assert_eq!(details.pincode, "560001");
    }

    #[test]
    fn partial_or_malformed_forms_are_rejected() {
        let mut form = full_form();
        form.city = Some("  ".into());
        assert_eq!(
            shipping_details(&form).unwrap_err().to_string(),
            "All shipping details are required"
        );

        let mut form = full_form();
        form.customer_phone = Some("12345".into());
        assert_eq!(
            shipping_details(&form).unwrap_err().to_string(),
            "Phone number must be 10 digits"
        );

        let mut form = full_form();
        form.pincode = Some("5600".into());
        assert_eq!(shipping_details(&form).unwrap_err().to_string(), "Pincode must be 6 digits");
    }
}
