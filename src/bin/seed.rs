use storefront::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    qr,
    services::auth_service::hash_password,
    validation::slugify,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_admin(&pool, "Admin User", "admin@example.com", "admin123").await?;
    seed_categories(&pool).await?;
    seed_products(&pool, &config.base_url).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_admin(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let (admin_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO admins (id, name, email, password_hash)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    println!("Ensured admin {email}");
    Ok(admin_id)
}

async fn seed_categories(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = [
        ("Silk", "Kanjivaram, Banarasi and other silk sarees", 1),
        ("Cotton", "Handloom cotton for everyday wear", 2),
        ("Chiffon", "Light designer sarees for parties", 3),
        ("Georgette", "Embroidered georgette for any occasion", 4),
    ];

    for (name, description, sort_order) in categories {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, description, is_active, sort_order)
            VALUES ($1, $2, $3, $4, TRUE, $5)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slugify(name))
        .bind(description)
        .bind(sort_order)
        .execute(pool)
        .await?;
    }

    println!("Seeded categories");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool, base_url: &str) -> anyhow::Result<()> {
    let products = [
        (
            "Silk Kanjivaram Saree",
            "Traditional Kanjivaram silk saree with intricate zari work.",
            15000,
            25,
            "Silk",
        ),
        (
            "Banarasi Silk Saree",
            "Banarasi silk saree with gold and silver brocade.",
            12000,
            30,
            "Silk",
        ),
        (
            "Cotton Handloom Saree",
            "Comfortable handloom cotton saree for daily wear.",
            2500,
            50,
            "Cotton",
        ),
        (
            "Chiffon Designer Saree",
            "Chiffon saree with contemporary patterns for formal events.",
            4500,
            40,
            "Chiffon",
        ),
        (
            "Georgette Embroidered Saree",
            "Lightweight georgette saree with embroidery work.",
            3500,
            35,
            "Georgette",
        ),
    ];

    for (title, description, price, stock, category) in products {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE title = $1")
            .bind(title)
            .fetch_optional(pool)
            .await?;
        if exists.is_some() {
            continue;
        }

        let code = qr::generate(base_url);
        sqlx::query(
            r#"
            INSERT INTO products
                (id, title, description, price, image, stock, category, category_id, qr_code, qr_code_image)
            VALUES ($1, $2, $3, $4, $5, $6, $7,
                    (SELECT id FROM categories WHERE name = $7), $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(description)
        .bind(price as i64)
        .bind(format!(
            "https://via.placeholder.com/400x600?text={}",
            title.replace(' ', "+")
        ))
        .bind(stock as i32)
        .bind(category)
        .bind(&code.url)
        .bind(&code.image_url)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
