//! Catalog statistics overview.
//!
//! Quick summary of what's in the catalog: product and ingredient counts,
//! association coverage, and per-food-type breakdowns. Used by `wdx stats`
//! to give confidence that imports are landing as expected.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await?;

    let total_ingredients: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ingredients")
        .fetch_one(&pool)
        .await?;

    let total_associations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_ingredients")
        .fetch_one(&pool)
        .await?;

    let products_with_ingredients: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT product_id) FROM product_ingredients",
    )
    .fetch_one(&pool)
    .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("WhiskerDex — Catalog Stats");
    println!("==========================");
    println!();
    println!("  Database:     {}", config.db.path.display());
    println!("  Size:         {}", format_bytes(db_size));
    println!();
    println!("  Products:     {}", total_products);
    println!("  Ingredients:  {}", total_ingredients);
    println!("  Associations: {}", total_associations);
    println!(
        "  Linked:       {} / {} products ({}%)",
        products_with_ingredients,
        total_products,
        if total_products > 0 {
            (products_with_ingredients * 100) / total_products
        } else {
            0
        }
    );

    // Per-food-type breakdown
    let type_rows = sqlx::query(
        r#"
        SELECT
            COALESCE(food_type, '(unset)') AS food_type,
            COUNT(*) AS product_count,
            COUNT(price) AS priced_count,
            AVG(price) AS avg_price
        FROM products
        GROUP BY food_type
        ORDER BY product_count DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    if !type_rows.is_empty() {
        println!();
        println!("  By food type:");
        println!(
            "  {:<12} {:>9} {:>8} {:>10}",
            "TYPE", "PRODUCTS", "PRICED", "AVG PRICE"
        );
        println!("  {}", "-".repeat(44));
        for row in &type_rows {
            let avg_price: Option<f64> = row.get("avg_price");
            println!(
                "  {:<12} {:>9} {:>8} {:>10}",
                row.get::<String, _>("food_type"),
                row.get::<i64, _>("product_count"),
                row.get::<i64, _>("priced_count"),
                avg_price
                    .map(|p| format!("{:.2}", p))
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
