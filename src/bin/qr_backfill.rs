//! `qr_backfill status` reports which products lack a QR code;
//! `qr_backfill generate` (the default) gives each of them one.

use storefront::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    services::product_service::{assign_qr_code, products_missing_qr, qr_status},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    let state = AppState::new(pool, config);

    match std::env::args().nth(1).as_deref() {
        None | Some("generate") => generate(&state).await,
        Some("status") => status(&state).await,
        Some(other) => anyhow::bail!("unknown command {other}; use `status` or `generate`"),
    }
}

async fn status(state: &AppState) -> anyhow::Result<()> {
    let summary = qr_status(state).await?;
    println!("Products: {}", summary.total);
    if summary.total == 0 {
        println!("No products found; run the seed binary first.");
        return Ok(());
    }

    for product in products_missing_qr(state).await? {
        println!("  missing: {} ({})", product.title, product.id);
    }
    println!("With QR code: {}", summary.with_qr());
    println!("Without QR code: {}", summary.missing);
    if summary.missing > 0 {
        println!("Run `qr_backfill generate` to fill them in.");
    }
    Ok(())
}

async fn generate(state: &AppState) -> anyhow::Result<()> {
    let products = products_missing_qr(state).await?;
    if products.is_empty() {
        println!("Every product already has a QR code.");
        return Ok(());
    }

    println!("Generating QR codes for {} products", products.len());
    for product in &products {
        let updated = assign_qr_code(state, product.id)
            .await
            .map_err(|err| anyhow::anyhow!("product {}: {err}", product.id))?;
        println!(
            "  {} -> {}",
            updated.title,
            updated.qr_code.as_deref().unwrap_or_default()
        );
    }
    println!("Done");
    Ok(())
}
