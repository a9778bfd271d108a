use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use storefront::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::{
        admin::UpdateOrderStatusRequest,
        cart::AddToCartRequest,
        orders::{CheckoutRequest, ReviewRequest},
    },
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
        products::{ActiveModel as ProductActive, Entity as Products, Model as ProductModel},
        reviews::{Column as ReviewCol, Entity as Reviews},
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::{AuthAdmin, AuthUser},
    services::{admin_service, cart_service, order_service, review_service},
    state::AppState,
};
use uuid::Uuid;

// Each test creates its own users and products, so they can share one database.
async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;

    let config = AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 3000,
        base_url: "http://localhost:3000".into(),
        upload_dir: std::env::temp_dir().join("storefront-test-uploads").display().to_string(),
        environment: "test".into(),
        session_ttl_hours: 1,
        body_limit_bytes: 10 * 1024 * 1024,
    };
    Ok(Some(AppState::new(pool, config)))
}

async fn create_user(state: &AppState, name: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(format!("{}@example.com", Uuid::new_v4())),
        password_hash: Set("dummy".into()),
        phone: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        name: user.name,
    })
}

async fn create_product(state: &AppState, title: &str, price: i64, stock: i32) -> anyhow::Result<ProductModel> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        description: Set("Product created by the order flow tests".into()),
        price: Set(price),
        original_price: Set(None),
        discount_percentage: Set(0),
        image: Set(None),
        stock: Set(stock),
        category: Set("Test".into()),
        category_id: Set(None),
        qr_code: Set(None),
        qr_code_image: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

async fn add(state: &AppState, user: &AuthUser, product_id: Uuid, quantity: i32) -> anyhow::Result<()> {
    cart_service::add_to_cart(state, user, AddToCartRequest { product_id, quantity }).await?;
    Ok(())
}

async fn stock_of(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {id} vanished"))?;
    Ok(product.stock)
}

#[tokio::test]
async fn checkout_totals_match_items_and_stock_is_decremented() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, "Asha").await?;
    let saree = create_product(&state, "Banarasi Silk Saree", 12000, 5).await?;
    let stole = create_product(&state, "Cotton Stole", 750, 10).await?;

    add(&state, &user, saree.id, 1).await?;
    add(&state, &user, stole.id, 2).await?;
    // adding again increments the existing row
    add(&state, &user, stole.id, 1).await?;

    let resp = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            customer_name: Some("Asha Rao".into()),
            customer_phone: Some("98765-43210".into()),
            shipping_address: Some("12 MG Road".into()),
            city: Some("Bengaluru".into()),
            state: Some("Karnataka".into()),
            pincode: Some("560001".into()),
        },
    )
    .await?;

    let placed = resp.data.expect("order data");
    assert_eq!(placed.order.status, "processing");
    assert_eq!(placed.order.customer_phone.as_deref(), Some("+919876543210"));
    assert_eq!(placed.order.total_amount, 12000 + 3 * 750);
    let item_total: i64 = placed
        .items
        .iter()
        .map(|item| item.unit_price * i64::from(item.quantity))
        .sum();
    assert_eq!(item_total, placed.order.total_amount);
    assert_eq!(resp.redirect, Some(format!("/orders/{}", placed.order.id)));

    assert_eq!(stock_of(&state, saree.id).await?, 4);
    assert_eq!(stock_of(&state, stole.id).await?, 7);

    let cart = cart_service::get_cart(&state, &user).await?;
    assert!(cart.data.expect("cart").items.is_empty());

    let again = order_service::checkout(&state, &user, CheckoutRequest::default()).await;
    assert!(matches!(again, Err(AppError::EmptyCart)));
    Ok(())
}

#[tokio::test]
async fn checkout_with_short_stock_changes_nothing() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, "Meera").await?;
    let plenty = create_product(&state, "Chiffon Designer Saree", 4500, 10).await?;
    let scarce = create_product(&state, "Georgette Embroidered Saree", 3500, 3).await?;

    add(&state, &user, plenty.id, 2).await?;
    add(&state, &user, scarce.id, 3).await?;

    // someone else bought two in the meantime
    let mut active: ProductActive = Products::find_by_id(scarce.id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("missing product"))?
        .into();
    active.stock = Set(1);
    active.update(&state.orm).await?;

    let result = order_service::checkout(&state, &user, CheckoutRequest::default()).await;
    match result {
        Err(AppError::InsufficientStock(title)) => assert_eq!(title, "Georgette Embroidered Saree"),
        other => panic!("expected insufficient stock, got {other:?}"),
    }

    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(orders, 0);
    let items = OrderItems::find()
        .filter(OrderItemCol::ProductId.is_in([plenty.id, scarce.id]))
        .count(&state.orm)
        .await?;
    assert_eq!(items, 0);
    assert_eq!(stock_of(&state, plenty.id).await?, 10);
    assert_eq!(stock_of(&state, scarce.id).await?, 1);

    let cart = cart_service::get_cart(&state, &user).await?;
    assert_eq!(cart.data.expect("cart").items.len(), 2);
    Ok(())
}

#[tokio::test]
async fn second_review_overwrites_the_first() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, "Kavya").await?;
    let product = create_product(&state, "Silk Kanjivaram Saree", 15000, 4).await?;

    let first = review_service::add_review(
        &state,
        &user,
        product.id,
        ReviewRequest {
            rating: 3,
            message: Some("Colour was darker than the photo".into()),
            order_id: None,
        },
    )
    .await?;
    assert_eq!(first.message, "Review added successfully!");
    assert_eq!(first.redirect, Some(format!("/products/{}", product.id)));

    let order_id = Uuid::new_v4();
    let second = review_service::add_review(
        &state,
        &user,
        product.id,
        ReviewRequest {
            rating: 5,
            message: Some("Grew on me, lovely drape".into()),
            order_id: Some(order_id),
        },
    )
    .await?;
    assert_eq!(second.message, "Review updated successfully!");
    assert_eq!(second.redirect, Some(format!("/orders/{order_id}")));

    let rows = Reviews::find()
        .filter(ReviewCol::UserId.eq(user.user_id))
        .filter(ReviewCol::ProductId.eq(product.id))
        .all(&state.orm)
        .await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].rating, 5);
    assert_eq!(rows[0].message.as_deref(), Some("Grew on me, lovely drape"));

    let invalid = review_service::add_review(
        &state,
        &user,
        product.id,
        ReviewRequest {
            rating: 6,
            message: None,
            order_id: None,
        },
    )
    .await;
    assert!(matches!(invalid, Err(AppError::BadRequest(msg)) if msg == "Invalid review data"));
    Ok(())
}

#[tokio::test]
async fn admin_moves_order_through_statuses() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, "Nila").await?;
    let product = create_product(&state, "Cotton Handloom Saree", 2500, 8).await?;
    add(&state, &user, product.id, 1).await?;

    let order = order_service::checkout(&state, &user, CheckoutRequest::default())
        .await?
        .data
        .expect("order data")
        .order;
    assert_eq!(order.status, "pending");

    let admin = AuthAdmin {
        admin_id: Uuid::new_v4(),
        name: "Admin".into(),
    };
    let updated = admin_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await?;
    assert_eq!(updated.message, "Order status updated!");
    assert_eq!(updated.data.expect("order").status, "shipped");

    let rejected = admin_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "lost".into(),
        },
    )
    .await;
    assert!(matches!(rejected, Err(AppError::BadRequest(msg)) if msg == "Invalid status"));

    let missing = admin_service::update_order_status(
        &state,
        &admin,
        Uuid::new_v4(),
        UpdateOrderStatusRequest {
            status: "delivered".into(),
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn concurrent_checkouts_cannot_both_take_the_last_unit() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let first = create_user(&state, "Lakshmi").await?;
    let second = create_user(&state, "Divya").await?;
    let last_one = create_product(&state, "Paithani Silk Saree", 18000, 1).await?;

    add(&state, &first, last_one.id, 1).await?;
    add(&state, &second, last_one.id, 1).await?;

    let (a, b) = tokio::join!(
        order_service::checkout(&state, &first, CheckoutRequest::default()),
        order_service::checkout(&state, &second, CheckoutRequest::default()),
    );

    let placed = [&a, &b].iter().filter(|result| result.is_ok()).count();
    assert_eq!(placed, 1, "exactly one checkout should win: {a:?} / {b:?}");
    let loser = if a.is_ok() { b } else { a };
    match loser {
        Err(AppError::InsufficientStock(title)) => assert_eq!(title, "Paithani Silk Saree"),
        other => panic!("expected insufficient stock, got {other:?}"),
    }

    let orders = Orders::find()
        .filter(OrderCol::UserId.is_in([first.user_id, second.user_id]))
        .count(&state.orm)
        .await?;
    assert_eq!(orders, 1);
    let items = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(last_one.id))
        .count(&state.orm)
        .await?;
    assert_eq!(items, 1);
    assert_eq!(stock_of(&state, last_one.id).await?, 0);
    Ok(())
}
