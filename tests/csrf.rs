use std::path::Path;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use storefront::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        products::{ActiveModel as ProductActive, Entity as Products, Model as ProductModel},
        sessions::{ActiveModel as SessionActive, Entity as Sessions},
        users::{ActiveModel as UserActive, Model as UserModel},
    },
    middleware::csrf::{CSRF_HEADER, generate_token},
    routes::create_router,
    session::{SESSION_COOKIE, SessionData},
    state::AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "0123456789abcdef0123456789abcdef";

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run csrf tests.");
            return Ok(None);
        }
    };
    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    Ok(Some(AppState::new(
        pool,
        AppConfig {
            database_url,
            host: "127.0.0.1".into(),
            port: 3000,
            base_url: "http://localhost:3000".into(),
            upload_dir: std::env::temp_dir().join("storefront-test-uploads").display().to_string(),
            environment: "test".into(),
            session_ttl_hours: 1,
            body_limit_bytes: 10 * 1024 * 1024,
        },
    )))
}

async fn create_user(state: &AppState) -> anyhow::Result<UserModel> {
    Ok(UserActive {
        id: Set(Uuid::new_v4()),
        name: Set("Riya".into()),
        email: Set(format!("{}@example.com", Uuid::new_v4())),
        password_hash: Set("dummy".into()),
        phone: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?)
}

async fn create_product(state: &AppState) -> anyhow::Result<ProductModel> {
    Ok(ProductActive {
        id: Set(Uuid::new_v4()),
        title: Set("Tussar Silk Saree".into()),
        description: Set("Product created by the csrf test".into()),
        price: Set(6800),
        original_price: Set(None),
        discount_percentage: Set(0),
        image: Set(None),
        stock: Set(4),
        category: Set("Silk".into()),
        category_id: Set(None),
        qr_code: Set(None),
        qr_code_image: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?)
}

/// Store a session row the way the login handlers would have.
async fn store_session(state: &AppState, data: SessionData, ttl: Duration) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    SessionActive {
        id: Set(id),
        data: Set(serde_json::to_value(&data)?),
        expires_at: Set((Utc::now() + ttl).into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

async fn user_session(state: &AppState, user: &UserModel) -> anyhow::Result<Uuid> {
    let data = SessionData {
        user_id: Some(user.id),
        user_name: Some(user.name.clone()),
        csrf_secret: Some(SECRET.into()),
        ..Default::default()
    };
    store_session(state, data, Duration::hours(1)).await
}

async fn cart_rows(state: &AppState, user_id: Uuid) -> anyhow::Result<u64> {
    Ok(CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .count(&state.orm)
        .await?)
}

async fn json_body(response: Response) -> anyhow::Result<serde_json::Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn state_changing_post_needs_the_session_token() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let product = create_product(&state).await?;
    let session_id = user_session(&state, &user).await?;

    let app = create_router(state.clone());
    let cookie = format!("{SESSION_COOKIE}={session_id}");
    let add_to_cart = |body: String| {
        Request::builder()
            .method("POST")
            .uri("/cart/add")
            .header(header::COOKIE, cookie.clone())
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
    };

    let form = format!("product_id={}&quantity=1", product.id);
    let response = app.clone().oneshot(add_to_cart(form.clone())?).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let forged = format!("{form}&_csrf={}", generate_token("not-the-secret", session_id));
    let response = app.clone().oneshot(add_to_cart(forged)?).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(cart_rows(&state, user.id).await?, 0);

    let valid = format!("{form}&_csrf={}", generate_token(SECRET, session_id));
    let response = app.oneshot(add_to_cart(valid)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cart_rows(&state, user.id).await?, 1);
    Ok(())
}

#[tokio::test]
async fn multipart_body_does_not_skip_the_token_check() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let product = create_product(&state).await?;
    let row = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        product_id: Set(product.id),
        quantity: Set(1),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    let session_id = user_session(&state, &user).await?;

    let app = create_router(state.clone());
    let remove = |token: Option<String>| {
        let mut request = Request::builder()
            .method("POST")
            .uri(format!("/cart/{}/remove", row.id))
            .header(header::COOKIE, format!("{SESSION_COOKIE}={session_id}"))
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=x");
        if let Some(token) = token {
            request = request.header(&CSRF_HEADER, token);
        }
        request.body(Body::from("--x--\r\n"))
    };

    let response = app.clone().oneshot(remove(None)?).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(cart_rows(&state, user.id).await?, 1);

    let response = app
        .oneshot(remove(Some(generate_token(SECRET, session_id)))?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cart_rows(&state, user.id).await?, 0);
    Ok(())
}

fn multipart_body(boundary: &str, fields: &[(&str, &str)], image: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"saree.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(image);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn product_form_accepts_images_above_two_megabytes() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let data = SessionData {
        admin_id: Some(Uuid::new_v4()),
        admin_name: Some("Admin".into()),
        csrf_secret: Some(SECRET.into()),
        ..Default::default()
    };
    let session_id = store_session(&state, data, Duration::hours(1)).await?;

    let image = vec![0xFF_u8; 3 * 1024 * 1024];
    let token = generate_token(SECRET, session_id);
    let boundary = "storefront-form";
    let body = multipart_body(
        boundary,
        &[
            ("title", "Large Photo Saree"),
            ("description", "Uploaded with a full-size product photo"),
            ("price", "5400"),
            ("stock", "2"),
            ("category", "Silk"),
            ("_csrf", &token),
        ],
        &image,
    );

    let app: Router = create_router(state.clone());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/products")
                .header(header::COOKIE, format!("{SESSION_COOKIE}={session_id}"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["message"], "Product created successfully!");
    let stored = body["data"]["image"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("product has no image"))?
        .to_string();
    let relative = stored
        .strip_prefix("/uploads/")
        .ok_or_else(|| anyhow::anyhow!("image {stored} is not a local upload"))?;
    let on_disk = Path::new(&state.config.upload_dir).join(relative);
    assert_eq!(tokio::fs::metadata(&on_disk).await?.len(), image.len() as u64);

    let id: Uuid = body["data"]["id"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("product has no id"))?
        .parse()?;
    Products::delete_by_id(id).exec(&state.orm).await?;
    tokio::fs::remove_file(on_disk).await?;
    Ok(())
}

#[tokio::test]
async fn anonymous_requests_store_no_session_until_a_token_is_issued() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let expired = store_session(&state, SessionData::default(), Duration::hours(-2)).await?;
    let app = create_router(state.clone());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key(header::SET_COOKIE));
    assert!(!response.headers().contains_key(&CSRF_HEADER));

    // the login form hands out a token, which needs a stored session
    let response = app
        .oneshot(Request::builder().uri("/auth/login").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::SET_COOKIE));
    assert!(response.headers().contains_key(&CSRF_HEADER));

    assert!(Sessions::find_by_id(expired).one(&state.orm).await?.is_none());
    Ok(())
}
