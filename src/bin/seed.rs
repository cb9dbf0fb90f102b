use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_retail_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let buyer_id = ensure_user(&pool, "buyer@example.com", "buyer123", "buyer").await?;
    let partner_id = ensure_user(&pool, "shop@example.com", "shop123", "shop").await?;
    let shop_id = ensure_shop(&pool, partner_id, "Svyaznoy", "http://svyaznoy.example/price").await?;
    seed_catalog(&pool, shop_id).await?;

    println!("Seed completed. Buyer ID: {buyer_id}, Partner ID: {partner_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    user_type: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = row {
        return Ok(id);
    }

    // Seeded accounts skip the confirmation step.
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, user_type, is_active)
        VALUES ($1, $2, $3, $4, TRUE)
        "#,
    )
    .bind(id)
    .bind(email)
    .bind(password_hash)
    .bind(user_type)
    .execute(pool)
    .await?;

    Ok(id)
}

async fn ensure_shop(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    name: &str,
    url: &str,
) -> anyhow::Result<Uuid> {
    let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM shops WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = row {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO shops (id, user_id, name, url, filename) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .bind(url)
    .bind("shop1.yaml")
    .execute(pool)
    .await?;

    Ok(id)
}

async fn seed_catalog(pool: &sqlx::PgPool, shop_id: Uuid) -> anyhow::Result<()> {
    let category_id = Uuid::new_v4();
    sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
        .bind(category_id)
        .bind("Smartphones")
        .execute(pool)
        .await?;
    let (category_id,): (Uuid,) = sqlx::query_as("SELECT id FROM categories WHERE name = $1")
        .bind("Smartphones")
        .fetch_one(pool)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO shop_categories (id, shop_id, category_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (shop_id, category_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(shop_id)
    .bind(category_id)
    .execute(pool)
    .await?;

    for (name, price, quantity) in [
        ("Apple iPhone XS Max 512GB", 110_000_i64, 14_i32),
        ("Samsung Galaxy S10", 75_000, 6),
    ] {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM products WHERE category_id = $1 AND name = $2")
                .bind(category_id)
                .bind(name)
                .fetch_optional(pool)
                .await?;
        let product_id = match row {
            Some((id,)) => id,
            None => {
                let id = Uuid::new_v4();
                sqlx::query("INSERT INTO products (id, category_id, name) VALUES ($1, $2, $3)")
                    .bind(id)
                    .bind(category_id)
                    .bind(name)
                    .execute(pool)
                    .await?;
                id
            }
        };

        sqlx::query(
            r#"
            INSERT INTO product_infos (id, product_id, shop_id, name, quantity, price, price_rrc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (product_id, shop_id) DO UPDATE
                SET quantity = EXCLUDED.quantity, price = EXCLUDED.price
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(shop_id)
        .bind(name)
        .bind(quantity)
        .bind(price)
        .bind(price + 5_000)
        .execute(pool)
        .await?;
    }

    Ok(())
}
