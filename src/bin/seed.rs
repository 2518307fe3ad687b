use tradefair_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "idp_admin", "admin@example.com", "Admin", "admin").await?;
    let buyer_id = ensure_user(&pool, "idp_buyer", "buyer@example.com", "Bola", "buyer").await?;
    let seller_id = ensure_user(&pool, "idp_seller", "seller@example.com", "Sade", "vendor").await?;

    let vendor_id = ensure_vendor(&pool, seller_id, "Sade Homewares").await?;
    seed_listings(&pool, vendor_id).await?;

    println!("Seed completed. Admin: {admin_id}, Buyer: {buyer_id}, Vendor: {vendor_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    external_id: &str,
    email: &str,
    display_name: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, external_id, email, display_name, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(external_id)
    .bind(email)
    .bind(display_name)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_vendor(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    business_name: &str,
) -> anyhow::Result<Uuid> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO vendors (id, user_id, business_name, status, approved_at)
        VALUES ($1, $2, $3, 'approved', now())
        ON CONFLICT (user_id) DO UPDATE SET business_name = EXCLUDED.business_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(business_name)
    .fetch_optional(pool)
    .await?;

    let vendor_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM vendors WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured vendor {business_name}");
    Ok(vendor_id)
}

async fn seed_listings(pool: &sqlx::PgPool, vendor_id: Uuid) -> anyhow::Result<()> {
    let listings = vec![
        ("Blue Mug", "Stoneware mug, holds 350ml", 1500_i64, 40, "kitchen"),
        ("Kettle Pro", "Gooseneck kettle for pour-over", 24000_i64, 12, "kitchen"),
        ("Linen Apron", "Heavy linen, adjustable straps", 9500_i64, 25, "kitchen"),
        ("Walnut Tray", "Hand-finished serving tray", 56000_i64, 5, "home"),
    ];

    for (title, description, price, inventory, category) in listings {
        sqlx::query(
            r#"
            INSERT INTO listings (id, vendor_id, title, description, price, inventory, categories, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(vendor_id)
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(inventory)
        .bind(vec![category.to_string()])
        .bind(vec![format!(
            "https://cdn.tradefair.app/seed/{}.jpg",
            title.to_lowercase().replace(' ', "-")
        )])
        .execute(pool)
        .await?;
    }

    println!("Seeded listings");
    Ok(())
}
