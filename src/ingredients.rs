//! Ingredient catalog queries.
//!
//! Ingredients are shared entities created lazily by the ingestion
//! pipeline; the fields beyond the name are filled in by separate
//! enrichment. These queries back the `wdx ingredients` CLI commands
//! and the HTTP API.

use anyhow::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::models::Ingredient;

/// Full ingredient view including the products that list it.
#[derive(Debug, Clone, Serialize)]
pub struct IngredientDetail {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub nutritional_value: serde_json::Value,
    pub common_allergens: serde_json::Value,
    pub products: Vec<ProductRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductRef {
    pub id: i64,
    pub name: String,
    pub brand: String,
}

pub async fn list_ingredients(pool: &SqlitePool, skip: i64, limit: i64) -> Result<Vec<Ingredient>> {
    let rows = sqlx::query(
        "SELECT id, name, description, nutritional_value, common_allergens \
         FROM ingredients ORDER BY name LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(ingredient_from_row).collect())
}

pub async fn get_ingredient(pool: &SqlitePool, id: i64) -> Result<Option<IngredientDetail>> {
    let row = sqlx::query(
        "SELECT id, name, description, nutritional_value, common_allergens \
         FROM ingredients WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let row = match row {
        Some(row) => row,
        None => return Ok(None),
    };
    let ingredient = ingredient_from_row(&row);

    let product_rows = sqlx::query(
        "SELECT p.id, p.name, p.brand FROM products p \
         JOIN product_ingredients pi ON pi.product_id = p.id \
         WHERE pi.ingredient_id = ? ORDER BY p.name",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let products = product_rows
        .iter()
        .map(|r| ProductRef {
            id: r.get("id"),
            name: r.get("name"),
            brand: r.get("brand"),
        })
        .collect();

    Ok(Some(IngredientDetail {
        id: ingredient.id,
        name: ingredient.name,
        description: ingredient.description,
        nutritional_value: ingredient.nutritional_value,
        common_allergens: ingredient.common_allergens,
        products,
    }))
}

fn ingredient_from_row(row: &sqlx::sqlite::SqliteRow) -> Ingredient {
    let nutritional: String = row.get("nutritional_value");
    let allergens: String = row.get("common_allergens");

    Ingredient {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        nutritional_value: serde_json::from_str(&nutritional).unwrap_or(serde_json::json!({})),
        common_allergens: serde_json::from_str(&allergens).unwrap_or(serde_json::json!([])),
    }
}

/// CLI entry point for `wdx ingredients list`.
pub async fn run_list(config: &Config, skip: i64, limit: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let ingredients = list_ingredients(&pool, skip, limit).await?;
    pool.close().await;

    if ingredients.is_empty() {
        println!("No ingredients found.");
        return Ok(());
    }

    println!("{:<6} {:<32} {}", "ID", "NAME", "ALLERGENS");
    println!("{}", "-".repeat(70));
    for ing in &ingredients {
        let allergens = ing
            .common_allergens
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        println!(
            "{:<6} {:<32} {}",
            ing.id,
            ing.name,
            if allergens.is_empty() { "-" } else { allergens.as_str() }
        );
    }
    println!();
    println!("{} ingredient(s)", ingredients.len());

    Ok(())
}

/// CLI entry point for `wdx ingredients get <id>`.
pub async fn run_get(config: &Config, id: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let ingredient = get_ingredient(&pool, id).await?;
    pool.close().await;

    let ingredient = match ingredient {
        Some(i) => i,
        None => {
            eprintln!("Error: ingredient not found: {}", id);
            std::process::exit(1);
        }
    };

    println!("--- Ingredient ---");
    println!("id:          {}", ingredient.id);
    println!("name:        {}", ingredient.name);
    if let Some(ref desc) = ingredient.description {
        println!("description: {}", desc);
    }
    println!("nutrition:   {}", ingredient.nutritional_value);
    println!("allergens:   {}", ingredient.common_allergens);

    println!();
    println!("--- Listed by ({}) ---", ingredient.products.len());
    for p in &ingredient.products {
        println!("  [{}] {} — {}", p.id, p.name, p.brand);
    }

    Ok(())
}
