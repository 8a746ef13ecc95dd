//! Product catalog queries.
//!
//! Read-side listing with filters and pagination, fetch-by-id with the
//! linked ingredient set, and the explicit administrative delete. Used by
//! both the `wdx products` CLI commands and the HTTP API.

use anyhow::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;

/// Filters for product listing. `skip`/`limit` paginate; the remaining
/// fields narrow the result set when present.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub age_group: Option<String>,
    pub food_type: Option<String>,
    pub brand: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

/// One row of a product listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub brand: String,
    pub price: Option<f64>,
    pub age_group: Option<String>,
    pub food_type: Option<String>,
    pub image_url: Option<String>,
    pub shopping_url: Option<String>,
}

/// Full product view including the linked ingredients.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub id: i64,
    pub name: String,
    pub brand: String,
    pub price: Option<f64>,
    pub age_group: Option<String>,
    pub food_type: Option<String>,
    pub description: Option<String>,
    pub ingredient_list: Option<String>,
    pub image_url: Option<String>,
    pub shopping_url: Option<String>,
    pub created_at: String, // ISO8601
    pub updated_at: String, // ISO8601
    pub ingredients: Vec<IngredientRef>,
}

/// Ingredient reference as embedded in a product view.
#[derive(Debug, Clone, Serialize)]
pub struct IngredientRef {
    pub id: i64,
    pub name: String,
}

pub async fn list_products(pool: &SqlitePool, filter: &ProductFilter) -> Result<Vec<ProductSummary>> {
    let mut sql = String::from(
        "SELECT id, name, brand, price, age_group, food_type, image_url, shopping_url \
         FROM products WHERE 1=1",
    );
    if filter.age_group.is_some() {
        sql.push_str(" AND age_group = ?");
    }
    if filter.food_type.is_some() {
        sql.push_str(" AND food_type = ?");
    }
    if filter.brand.is_some() {
        sql.push_str(" AND brand = ? COLLATE NOCASE");
    }
    sql.push_str(" ORDER BY id ASC LIMIT ? OFFSET ?");

    let mut query = sqlx::query(&sql);
    if let Some(v) = &filter.age_group {
        query = query.bind(v);
    }
    if let Some(v) = &filter.food_type {
        query = query.bind(v);
    }
    if let Some(v) = &filter.brand {
        query = query.bind(v);
    }
    query = query.bind(filter.limit).bind(filter.skip);

    let rows = query.fetch_all(pool).await?;

    Ok(rows
        .iter()
        .map(|row| ProductSummary {
            id: row.get("id"),
            name: row.get("name"),
            brand: row.get("brand"),
            price: row.get("price"),
            age_group: row.get("age_group"),
            food_type: row.get("food_type"),
            image_url: row.get("image_url"),
            shopping_url: row.get("shopping_url"),
        })
        .collect())
}

pub async fn get_product(pool: &SqlitePool, id: i64) -> Result<Option<ProductDetail>> {
    let row = sqlx::query(
        "SELECT id, name, brand, price, age_group, food_type, description, ingredient_list, \
         image_url, shopping_url, created_at, updated_at FROM products WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let row = match row {
        Some(row) => row,
        None => return Ok(None),
    };

    let ingredient_rows = sqlx::query(
        "SELECT i.id, i.name FROM ingredients i \
         JOIN product_ingredients pi ON pi.ingredient_id = i.id \
         WHERE pi.product_id = ? ORDER BY i.name",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let ingredients = ingredient_rows
        .iter()
        .map(|r| IngredientRef {
            id: r.get("id"),
            name: r.get("name"),
        })
        .collect();

    let created_at: i64 = row.get("created_at");
    let updated_at: i64 = row.get("updated_at");

    Ok(Some(ProductDetail {
        id: row.get("id"),
        name: row.get("name"),
        brand: row.get("brand"),
        price: row.get("price"),
        age_group: row.get("age_group"),
        food_type: row.get("food_type"),
        description: row.get("description"),
        ingredient_list: row.get("ingredient_list"),
        image_url: row.get("image_url"),
        shopping_url: row.get("shopping_url"),
        created_at: format_ts_iso(created_at),
        updated_at: format_ts_iso(updated_at),
        ingredients,
    }))
}

/// Delete a product and its association rows. Returns `false` when no
/// product with that id exists. Ingredients are shared entities and are
/// never deleted here.
pub async fn delete_product(pool: &SqlitePool, id: i64) -> Result<bool> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM product_ingredients WHERE product_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

/// CLI entry point for `wdx products list`.
pub async fn run_list(config: &Config, filter: &ProductFilter) -> Result<()> {
    let pool = db::connect(config).await?;
    let products = list_products(&pool, filter).await?;
    pool.close().await;

    if products.is_empty() {
        println!("No products found.");
        return Ok(());
    }

    println!(
        "{:<6} {:<36} {:<20} {:>8}  {:<8} {:<6}",
        "ID", "NAME", "BRAND", "PRICE", "AGE", "TYPE"
    );
    println!("{}", "-".repeat(90));
    for p in &products {
        println!(
            "{:<6} {:<36} {:<20} {:>8}  {:<8} {:<6}",
            p.id,
            truncate(&p.name, 36),
            truncate(&p.brand, 20),
            p.price.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string()),
            p.age_group.as_deref().unwrap_or("-"),
            p.food_type.as_deref().unwrap_or("-"),
        );
    }
    println!();
    println!("{} product(s)", products.len());

    Ok(())
}

/// CLI entry point for `wdx products get <id>`.
pub async fn run_get(config: &Config, id: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let product = get_product(&pool, id).await?;
    pool.close().await;

    let product = match product {
        Some(p) => p,
        None => {
            eprintln!("Error: product not found: {}", id);
            std::process::exit(1);
        }
    };

    println!("--- Product ---");
    println!("id:           {}", product.id);
    println!("name:         {}", product.name);
    println!("brand:        {}", product.brand);
    if let Some(price) = product.price {
        println!("price:        {:.2}", price);
    }
    if let Some(ref v) = product.age_group {
        println!("age_group:    {}", v);
    }
    if let Some(ref v) = product.food_type {
        println!("food_type:    {}", v);
    }
    if let Some(ref v) = product.shopping_url {
        println!("shopping_url: {}", v);
    }
    if let Some(ref v) = product.image_url {
        println!("image_url:    {}", v);
    }
    println!("created_at:   {}", product.created_at);
    println!("updated_at:   {}", product.updated_at);
    if let Some(ref v) = product.description {
        println!();
        println!("--- Description ---");
        println!("{}", v);
    }

    println!();
    println!("--- Ingredients ({}) ---", product.ingredients.len());
    for ing in &product.ingredients {
        println!("  [{}] {}", ing.id, ing.name);
    }

    Ok(())
}

/// CLI entry point for `wdx products delete <id>`.
pub async fn run_delete(config: &Config, id: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let deleted = delete_product(&pool, id).await?;
    pool.close().await;

    if deleted {
        println!("Product {} deleted.", id);
    } else {
        eprintln!("Error: product not found: {}", id);
        std::process::exit(1);
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
