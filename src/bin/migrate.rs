//! `migrate up` applies pending migrations; `migrate down [target]` reverts
//! everything newer than `target` (default 0, i.e. all of them).

use storefront::{
    config::AppConfig,
    db::{create_pool, revert_migrations, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None | Some("up") => {
            run_migrations(&pool).await?;
            println!("Migrations applied");
        }
        Some("down") => {
            let target = match args.next() {
                Some(raw) => raw
                    .parse::<i64>()
                    .map_err(|_| anyhow::anyhow!("target must be a migration version, got {raw}"))?,
                None => 0,
            };
            revert_migrations(&pool, target).await?;
            println!("Migrations reverted to {target}");
        }
        Some(other) => anyhow::bail!("unknown command {other}; use `up` or `down [target]`"),
    }
    Ok(())
}
