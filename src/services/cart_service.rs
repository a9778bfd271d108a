use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, FromQueryResult,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::cart::{AddToCartRequest, CartLine, CartView, UpdateCartRequest},
    entity::{
        cart_items::{self, ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartItem,
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, FromQueryResult)]
struct CartLineRow {
    id: Uuid,
    product_id: Uuid,
    quantity: i32,
    title: String,
    price: i64,
    image: Option<String>,
    stock: i32,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        CartLine {
            id: row.id,
            product_id: row.product_id,
            title: row.title,
            price: row.price,
            image: row.image,
            stock: row.stock,
            quantity: row.quantity,
            subtotal: row.price * i64::from(row.quantity),
        }
    }
}

/// Cart rows joined with their products, newest first.
pub async fn cart_lines<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Vec<CartLine>> {
    let rows = CartItems::find()
        .select_only()
        .column(CartCol::Id)
        .column(CartCol::ProductId)
        .column(CartCol::Quantity)
        .column(ProdCol::Title)
        .column(ProdCol::Price)
        .column(ProdCol::Image)
        .column(ProdCol::Stock)
        .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
        .filter(CartCol::UserId.eq(user_id))
        .order_by_desc(CartCol::CreatedAt)
        .into_model::<CartLineRow>()
        .all(conn)
        .await?;

    Ok(rows.into_iter().map(CartLine::from).collect())
}

/// Number of units in the cart, for the header badge.
pub async fn cart_count(pool: &DbPool, user_id: Uuid) -> AppResult<i64> {
    let count: (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM cart_items WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count.0)
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let items = cart_lines(&state.orm, user.user_id).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Cart",
        CartView::new(items),
        Some(Meta::new(1, total, total)),
    ))
}

fn insufficient_stock() -> AppError {
    AppError::BadRequest("Insufficient stock".into())
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest("Invalid quantity".into()));
    }

    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    if product.stock < payload.quantity {
        return Err(insufficient_stock());
    }

    let existing = CartItems::find()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user.user_id))
                .add(CartCol::ProductId.eq(product.id)),
        )
        .one(&state.orm)
        .await?;

    let item = match existing {
        Some(item) => {
            let quantity = item.quantity + payload.quantity;
            if quantity > product.stock {
                return Err(insufficient_stock());
            }
            let mut active: CartActive = item.into();
            active.quantity = Set(quantity);
            active.update(&state.orm).await?
        }
        None => {
            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(product.id),
                quantity: Set(payload.quantity),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await?
        }
    };

    tracing::debug!(user_id = %user.user_id, product_id = %product.id, quantity = item.quantity, "cart updated");
    Ok(ApiResponse::success("Item added to cart!", CartItem::from(item), None).redirect_to("/cart"))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    cart_id: Uuid,
    payload: UpdateCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest("Invalid quantity".into()));
    }

    let item = CartItems::find_by_id(cart_id)
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Cart item"))?;

    let product = Products::find_by_id(item.product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    if product.stock < payload.quantity {
        return Err(insufficient_stock());
    }

    let mut active: CartActive = item.into();
    active.quantity = Set(payload.quantity);
    let item = active.update(&state.orm).await?;

    Ok(ApiResponse::success("Cart updated!", CartItem::from(item), None).redirect_to("/cart"))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    cart_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::Id.eq(cart_id))
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Cart item"));
    }

    Ok(ApiResponse::success(
        "Item removed from cart!",
        serde_json::json!({}),
        Some(Meta::empty()),
    )
    .redirect_to("/cart"))
}
