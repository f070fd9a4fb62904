use fashion_store_api::{config::AppConfig, db::create_pool};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let shirts = ensure_category(&pool, "Shirts").await?;
    let punjabis = ensure_category(&pool, "Punjabis").await?;
    seed_products(&pool, shirts, punjabis).await?;

    println!("Seed completed.");
    Ok(())
}

async fn ensure_category(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let row: (Uuid,) = sqlx::query_as("INSERT INTO categories (id, name) VALUES ($1, $2) RETURNING id")
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(pool)
        .await?;

    println!("Ensured category {name}");
    Ok(row.0)
}

async fn seed_products(
    pool: &sqlx::PgPool,
    shirts: Uuid,
    punjabis: Uuid,
) -> anyhow::Result<()> {
    let products = vec![
        (
            shirts,
            "Classic Blue Shirt",
            "Slim fit, full sleeve",
            Decimal::new(119900, 2),
            "100001",
        ),
        (
            shirts,
            "Checked Casual Shirt",
            "Half sleeve summer wear",
            Decimal::new(89900, 2),
            "100002",
        ),
        (
            punjabis,
            "Eid Premium Punjabi",
            "Embroidered collar",
            Decimal::new(249900, 2),
            "100003",
        ),
    ];

    for (category_id, name, description, price, code) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, category_id, name, description, price, code)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category_id)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(code)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
