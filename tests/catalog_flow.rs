use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use storefront::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::categories::CategoryRequest,
    entity::products::{ActiveModel as ProductActive, Model as ProductModel},
    error::AppError,
    qr,
    routes::params::{CatalogParams, Listing},
    services::{catalog_service, category_service, product_service},
    state::AppState,
};
use uuid::Uuid;

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run catalog tests.");
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

async fn create_product(
    state: &AppState,
    title: String,
    price: i64,
    category: &str,
    qr_code: Option<String>,
) -> anyhow::Result<ProductModel> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        description: Set("Product created by the catalog tests".into()),
        price: Set(price),
        original_price: Set(None),
        discount_percentage: Set(0),
        image: Set(None),
        stock: Set(5),
        category: Set(category.to_string()),
        category_id: Set(None),
        qr_code: Set(qr_code),
        qr_code_image: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

#[tokio::test]
async fn price_filter_and_sort_are_applied() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    // a token only this test's products carry keeps other rows out of the result
    let token = Uuid::new_v4().simple().to_string();
    for price in [500, 4200, 1000, 5000, 2750, 9000] {
        create_product(&state, format!("Saree {token} {price}"), price, "Silk", None).await?;
    }

    let params = CatalogParams::from_query_str(&format!(
        "search={token}&minPrice=1000&maxPrice=5000&sortBy=price&sortOrder=asc"
    ));
    let page = catalog_service::catalog_page(&state, params, Listing::Collections)
        .await?
        .data
        .expect("catalog page");

    let prices: Vec<i64> = page.products.iter().map(|p| p.product.price).collect();
    assert_eq!(prices, vec![1000, 2750, 4200, 5000]);
    assert_eq!(page.total_products, 4);
    assert!(!page.has_more);
    assert_eq!(page.sort_by, "price");
    assert_eq!(page.sort_order, "asc");

    let more = catalog_service::load_more(
        &state,
        CatalogParams::from_query_str(&format!("search={token}&sortBy=price&sortOrder=desc&limit=2&offset=2")),
        Listing::Catalog,
    )
    .await?;
    let prices: Vec<i64> = more.products.iter().map(|p| p.product.price).collect();
    assert_eq!(prices, vec![4200, 2750]);
    assert!(more.has_more);
    assert_eq!(more.total, 6);
    assert_eq!(more.offset, 4);
    Ok(())
}

#[tokio::test]
async fn qr_code_lookup_matches_the_whole_code() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let code = qr::generate(&state.config.base_url);
    let product = create_product(
        &state,
        format!("Scanned Saree {}", Uuid::new_v4()),
        3000,
        "Cotton",
        Some(code.url.clone()),
    )
    .await?;

    let page = catalog_service::product_by_qr_code(&state, &code.number)
        .await?
        .data
        .expect("qr page");
    assert_eq!(page.product.id, product.id);
    assert_eq!(page.qr_code_number.as_deref(), Some(code.number.as_str()));
    assert_eq!(page.total_ratings, 0);

    // a prefix of a real code is not a match
    let prefix = &code.number[..code.number.len() - 2];
    let missing = catalog_service::product_by_qr_code(&state, prefix).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn categories_reject_duplicates_and_protect_used_ones() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let name = format!("Kids Wear {}", Uuid::new_v4().simple());

    let created = category_service::create_category(
        &state,
        CategoryRequest {
            name: format!("  {name}  "),
            description: Some("Festive wear for children".into()),
            is_active: true,
            sort_order: Some(3),
        },
    )
    .await?;
    let category = created.data.expect("category");
    assert_eq!(category.name, name);
    assert_eq!(category.sort_order, 3);
    assert!(category.slug.starts_with("kids-wear-"));

    let duplicate = category_service::create_category(
        &state,
        CategoryRequest {
            name: name.clone(),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(msg)) if msg == "Category with this name already exists"));

    let similar = category_service::create_category(
        &state,
        CategoryRequest {
            name: format!("{name}!!"),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(similar, Err(AppError::BadRequest(msg)) if msg == "Category with similar name already exists"));

    // products still refer to categories by name
    create_product(&state, format!("Lehenga {}", Uuid::new_v4()), 2200, &name, None).await?;
    let blocked = category_service::delete_category(&state, category.id).await;
    assert!(matches!(
        blocked,
        Err(AppError::BadRequest(msg)) if msg == "Cannot delete category. 1 product(s) are using this category."
    ));

    let listed = category_service::list_categories(&state).await?.data.expect("categories");
    let row = listed
        .items
        .iter()
        .find(|c| c.category.id == category.id)
        .expect("created category is listed");
    assert_eq!(row.product_count, 1);
    Ok(())
}

#[tokio::test]
async fn backfill_replaces_missing_and_legacy_qr_codes() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let token = Uuid::new_v4().simple().to_string();
    let missing = create_product(&state, format!("Saree {token} none"), 3000, "Silk", None).await?;
    let legacy = create_product(
        &state,
        format!("Saree {token} legacy"),
        3000,
        "Silk",
        Some(format!("http://localhost:3000/products/barcode/{token}")),
    )
    .await?;
    let current = create_product(
        &state,
        format!("Saree {token} current"),
        3000,
        "Silk",
        Some(qr::generate(&state.config.base_url).url),
    )
    .await?;

    let pending: Vec<Uuid> = product_service::products_missing_qr(&state)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert!(pending.contains(&missing.id));
    assert!(pending.contains(&legacy.id));
    assert!(!pending.contains(&current.id));
    let status = product_service::qr_status(&state).await?;
    assert!(status.missing >= 2);
    assert!(status.total >= 3);

    for id in [missing.id, legacy.id] {
        let updated = product_service::assign_qr_code(&state, id).await?;
        let stored = updated.qr_code.expect("qr code assigned");
        assert!(stored.starts_with("http://localhost:3000/products/qrcode/SHC"));
        assert!(updated.qr_code_image.is_some());
        // only the QR columns change
        assert!(updated.title.contains(&token));
        assert_eq!(updated.price, 3000);
    }

    let pending = product_service::products_missing_qr(&state).await?;
    assert!(pending.iter().all(|p| p.id != missing.id && p.id != legacy.id));

    let unknown = product_service::assign_qr_code(&state, Uuid::new_v4()).await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));
    Ok(())
}
