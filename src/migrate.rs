use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Create products table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            brand TEXT NOT NULL,
            price REAL,
            age_group TEXT,
            food_type TEXT,
            description TEXT,
            ingredient_list TEXT,
            image_url TEXT,
            shopping_url TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create ingredients table. The NOCASE unique constraint on the name
    // is the arbiter for concurrent lookup-or-create: the second insert of
    // a name variant loses and falls back to reading the winner's row.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ingredients (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL COLLATE NOCASE UNIQUE,
            description TEXT,
            nutritional_value TEXT NOT NULL DEFAULT '{}',
            common_allergens TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create product/ingredient join table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product_ingredients (
            product_id INTEGER NOT NULL,
            ingredient_id INTEGER NOT NULL,
            PRIMARY KEY (product_id, ingredient_id),
            FOREIGN KEY (product_id) REFERENCES products(id),
            FOREIGN KEY (ingredient_id) REFERENCES ingredients(id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create indexes. Product identity is (name, brand) case-insensitively,
    // or the shopping URL when one is present.
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_products_name_brand \
         ON products(name COLLATE NOCASE, brand COLLATE NOCASE)",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_products_shopping_url \
         ON products(shopping_url) WHERE shopping_url IS NOT NULL",
    )
    .execute(&pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_age_group ON products(age_group)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_food_type ON products(food_type)")
        .execute(&pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_product_ingredients_ingredient \
         ON product_ingredients(ingredient_id)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
