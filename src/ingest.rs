//! Ingestion pipeline orchestration.
//!
//! Merges a batch of candidate product records into the catalog without
//! creating duplicate products or duplicate ingredients: normalization →
//! duplicate check (shopping URL first, then case-insensitive name+brand)
//! → ingredient lookup-or-create → association replacement.
//!
//! Commit discipline is per-record: each record runs in its own
//! transaction, a failed record is rolled back and recorded as a row
//! error, and the batch continues. The caller always gets a summary,
//! never a bare error, for row-level problems.

use anyhow::{bail, Result};
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use std::path::Path;

use crate::config::Config;
use crate::csv_source;
use crate::db;
use crate::models::{CandidateRecord, IngestMode, NormalizedRecord};
use crate::normalize::normalize_record;

/// A row-level problem that did not abort the batch.
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    /// Zero-based index of the record within the batch.
    pub row_index: usize,
    pub reason: String,
}

/// Structured result of one ingestion batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestSummary {
    pub products_created: u64,
    pub products_updated: u64,
    pub duplicates_skipped: u64,
    pub errors: Vec<RowError>,
    /// Names of ingredients created by this batch, in creation order.
    pub ingredients_created: Vec<String>,
}

/// What happened to a single record.
enum Outcome {
    Created,
    Updated,
    Skipped,
}

/// Result of one committed record: its outcome plus the ingredients it
/// created and the cache entries it resolved. Cache entries are only
/// published to the batch after the record's transaction commits, so a
/// rolled-back record cannot leak phantom ingredient ids.
struct RecordResult {
    outcome: Outcome,
    new_ingredients: Vec<String>,
    resolved: Vec<(String, i64)>,
}

/// Ingest a batch of candidate records sequentially, in order.
///
/// Row-level failures (validation or database errors) are recorded in the
/// summary and do not abort the batch; previously committed records stay
/// committed.
pub async fn ingest_batch(
    pool: &SqlitePool,
    records: &[CandidateRecord],
    mode: IngestMode,
) -> Result<IngestSummary> {
    let mut summary = IngestSummary::default();

    // Batch-local ingredient cache: lowercase name -> id. Guarantees that
    // processing the same name twice within one call resolves to one row
    // without a second round-trip.
    let mut ingredient_cache: HashMap<String, i64> = HashMap::new();

    for (row_index, record) in records.iter().enumerate() {
        let normalized = match normalize_record(record) {
            Ok(n) => n,
            Err(reason) => {
                summary.errors.push(RowError { row_index, reason });
                continue;
            }
        };

        match ingest_record(pool, &normalized, mode, &ingredient_cache).await {
            Ok(result) => {
                match result.outcome {
                    Outcome::Created => summary.products_created += 1,
                    Outcome::Updated => summary.products_updated += 1,
                    Outcome::Skipped => summary.duplicates_skipped += 1,
                }
                summary.ingredients_created.extend(result.new_ingredients);
                for (key, id) in result.resolved {
                    ingredient_cache.insert(key, id);
                }
            }
            Err(e) => {
                summary.errors.push(RowError {
                    row_index,
                    reason: format!("database error: {:#}", e),
                });
            }
        }
    }

    Ok(summary)
}

/// Process one normalized record inside its own transaction.
async fn ingest_record(
    pool: &SqlitePool,
    record: &NormalizedRecord,
    mode: IngestMode,
    ingredient_cache: &HashMap<String, i64>,
) -> Result<RecordResult> {
    let mut tx = pool.begin().await?;

    let existing_id = find_existing(&mut tx, record).await?;

    if existing_id.is_some() && mode == IngestMode::Skip {
        // Dropping the transaction rolls it back; nothing was written.
        return Ok(RecordResult {
            outcome: Outcome::Skipped,
            new_ingredients: Vec::new(),
            resolved: Vec::new(),
        });
    }

    let now = chrono::Utc::now().timestamp();

    let (product_id, outcome) = match existing_id {
        Some(id) => {
            update_product(&mut tx, id, record, now).await?;
            (id, Outcome::Updated)
        }
        None => {
            let id = insert_product(&mut tx, record, now).await?;
            (id, Outcome::Created)
        }
    };

    let mut new_ingredients = Vec::new();
    let mut resolved = Vec::new();

    // Replace the association set only when the record carried an
    // ingredient list; a sparse re-ingest must not wipe existing links.
    if record.ingredient_list.is_some() {
        let mut ingredient_ids = Vec::new();
        for name in &record.ingredients {
            let key = name.to_ascii_lowercase();
            let cached = ingredient_cache.get(&key).copied().or_else(|| {
                resolved
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, id)| *id)
            });
            let id = match cached {
                Some(id) => id,
                None => {
                    let (id, created) = lookup_or_create_ingredient(&mut tx, name).await?;
                    if created {
                        new_ingredients.push(name.clone());
                    }
                    resolved.push((key, id));
                    id
                }
            };
            if !ingredient_ids.contains(&id) {
                ingredient_ids.push(id);
            }
        }

        replace_associations(&mut tx, product_id, &ingredient_ids).await?;
    }

    tx.commit().await?;

    Ok(RecordResult {
        outcome,
        new_ingredients,
        resolved,
    })
}

/// Duplicate check. The shopping URL, when present, takes precedence over
/// the (name, brand) pair: a URL match updates that row even if the names
/// disagree, since the URL is the only externally-assigned identifier.
async fn find_existing(
    tx: &mut Transaction<'_, Sqlite>,
    record: &NormalizedRecord,
) -> Result<Option<i64>> {
    if let Some(url) = &record.shopping_url {
        let by_url: Option<i64> =
            sqlx::query_scalar("SELECT id FROM products WHERE shopping_url = ?")
                .bind(url)
                .fetch_optional(&mut **tx)
                .await?;
        if by_url.is_some() {
            return Ok(by_url);
        }
    }

    let by_identity: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM products WHERE name = ? COLLATE NOCASE AND brand = ? COLLATE NOCASE",
    )
    .bind(&record.name)
    .bind(&record.brand)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(by_identity)
}

async fn insert_product(
    tx: &mut Transaction<'_, Sqlite>,
    record: &NormalizedRecord,
    now: i64,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO products (name, brand, price, age_group, food_type, description, ingredient_list, image_url, shopping_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.name)
    .bind(&record.brand)
    .bind(record.price)
    .bind(&record.age_group)
    .bind(&record.food_type)
    .bind(&record.description)
    .bind(&record.ingredient_list)
    .bind(&record.image_url)
    .bind(&record.shopping_url)
    .bind(now)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Refresh an existing row. Name and brand always overwrite (a URL match
/// may rename the product); optional fields overwrite only when present,
/// so a sparse feed cannot erase enrichment done by hand.
async fn update_product(
    tx: &mut Transaction<'_, Sqlite>,
    id: i64,
    record: &NormalizedRecord,
    now: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE products SET
            name = ?,
            brand = ?,
            price = COALESCE(?, price),
            age_group = COALESCE(?, age_group),
            food_type = COALESCE(?, food_type),
            description = COALESCE(?, description),
            ingredient_list = COALESCE(?, ingredient_list),
            image_url = COALESCE(?, image_url),
            shopping_url = COALESCE(?, shopping_url),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&record.name)
    .bind(&record.brand)
    .bind(record.price)
    .bind(&record.age_group)
    .bind(&record.food_type)
    .bind(&record.description)
    .bind(&record.ingredient_list)
    .bind(&record.image_url)
    .bind(&record.shopping_url)
    .bind(now)
    .bind(id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Resolve an ingredient by case-insensitive name, creating it with only
/// the name populated when absent. Returns `(id, created)`.
///
/// The insert ignores a name-collision conflict and falls back to the
/// lookup, so a concurrent batch that won the insert race resolves to the
/// same row instead of failing.
///
/// Case folding is ASCII-only on both sides: the `NOCASE` collation on
/// the name column ignores case for ASCII letters only, and the batch
/// cache keys in [`ingest_record`] fold with `to_ascii_lowercase` to
/// match. Names differing only in non-ASCII case ("Café" vs "CAFÉ") are
/// distinct ingredients.
async fn lookup_or_create_ingredient(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<(i64, bool)> {
    let result = sqlx::query("INSERT INTO ingredients (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
        .bind(name)
        .execute(&mut **tx)
        .await?;
    let created = result.rows_affected() == 1;

    // The name column is COLLATE NOCASE, so this lookup is case-insensitive.
    let id: i64 = sqlx::query_scalar("SELECT id FROM ingredients WHERE name = ?")
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;

    Ok((id, created))
}

/// Replace the product's association set with the resolved ingredient ids.
async fn replace_associations(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: i64,
    ingredient_ids: &[i64],
) -> Result<()> {
    sqlx::query("DELETE FROM product_ingredients WHERE product_id = ?")
        .bind(product_id)
        .execute(&mut **tx)
        .await?;

    for ingredient_id in ingredient_ids {
        sqlx::query("INSERT INTO product_ingredients (product_id, ingredient_id) VALUES (?, ?)")
            .bind(product_id)
            .bind(ingredient_id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

/// CLI entry point for `wdx ingest <csv>`.
pub async fn run_import(
    config: &Config,
    path: &Path,
    mode_flag: Option<&str>,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<()> {
    let mode_str = mode_flag.unwrap_or(config.ingest.mode.as_str());
    let mode = match IngestMode::parse(mode_str) {
        Some(m) => m,
        None => bail!("Unknown ingest mode: '{}'. Must be update or skip.", mode_str),
    };

    let mut records = csv_source::read_csv_path(path, &config.ingest.list_columns)?;
    let rows_found = records.len();
    if let Some(lim) = limit {
        records.truncate(lim);
    }

    if dry_run {
        let mut valid = 0usize;
        let mut invalid = 0usize;
        let mut names: Vec<String> = Vec::new();
        for record in &records {
            match normalize_record(record) {
                Ok(n) => {
                    valid += 1;
                    for name in n.ingredients {
                        let key = name.to_ascii_lowercase();
                        if !names.contains(&key) {
                            names.push(key);
                        }
                    }
                }
                Err(_) => invalid += 1,
            }
        }
        println!("ingest {} (dry-run)", path.display());
        println!("  rows found: {}", rows_found);
        println!("  valid rows: {}", valid);
        println!("  invalid rows: {}", invalid);
        println!("  distinct ingredient names: {}", names.len());
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let summary = ingest_batch(&pool, &records, mode).await?;
    pool.close().await;

    println!("ingest {} (mode: {})", path.display(), mode.as_str());
    println!("  rows: {}", records.len());
    println!("  products created: {}", summary.products_created);
    println!("  products updated: {}", summary.products_updated);
    println!("  duplicates skipped: {}", summary.duplicates_skipped);
    println!(
        "  ingredients created: {}",
        summary.ingredients_created.len()
    );
    if !summary.ingredients_created.is_empty() {
        println!("    {}", summary.ingredients_created.join(", "));
    }
    if !summary.errors.is_empty() {
        println!("  errors: {}", summary.errors.len());
        for e in &summary.errors {
            println!("    row {}: {}", e.row_index, e.reason);
        }
    }
    println!("ok");

    Ok(())
}
