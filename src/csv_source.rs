//! CSV input source.
//!
//! Reads candidate product records from a CSV file or an in-memory string.
//! The header row must contain at least `name` and `brand`; a file missing
//! either is rejected before any row processing begins. Recognized optional
//! columns: `price`, `age_group`, `food_type`, `description`, the
//! ingredient-list column (header names from `[ingest].list_columns`,
//! `ingredients` and `full_ingredient_list` by default), `image_url`,
//! `shopping_url`. Unknown columns are ignored.

use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;

use crate::models::CandidateRecord;

/// Column positions resolved from the header row.
struct ColumnMap {
    name: usize,
    brand: usize,
    price: Option<usize>,
    age_group: Option<usize>,
    food_type: Option<usize>,
    description: Option<usize>,
    ingredient_list: Option<usize>,
    image_url: Option<usize>,
    shopping_url: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord, list_columns: &[String]) -> Result<ColumnMap> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted))
        };

        let name = match find("name") {
            Some(i) => i,
            None => bail!("CSV header is missing required column: name"),
        };
        let brand = match find("brand") {
            Some(i) => i,
            None => bail!("CSV header is missing required column: brand"),
        };

        // Several header spellings are in the wild for the ingredient
        // cell; the first configured name that matches wins.
        let ingredient_list = list_columns.iter().find_map(|col| find(col));

        Ok(ColumnMap {
            name,
            brand,
            price: find("price"),
            age_group: find("age_group"),
            food_type: find("food_type"),
            description: find("description"),
            ingredient_list,
            image_url: find("image_url"),
            shopping_url: find("shopping_url"),
        })
    }
}

/// Read candidate records from a CSV file on disk.
pub fn read_csv_path(path: &Path, list_columns: &[String]) -> Result<Vec<CandidateRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;
    parse_csv_str(&content, list_columns)
}

/// Parse candidate records from CSV content. `list_columns` names the
/// headers recognized as the ingredient-list column.
///
/// File-level malformation (unreadable CSV, missing `name`/`brand` header)
/// is a hard error. Row-level problems are not handled here: short rows
/// simply yield absent fields, and field validation happens later in the
/// normalization step so one bad row cannot abort the batch.
pub fn parse_csv_str(content: &str, list_columns: &[String]) -> Result<Vec<CandidateRecord>> {
    parse_csv_reader(content.as_bytes(), list_columns)
}

fn parse_csv_reader<R: Read>(reader: R, list_columns: &[String]) -> Result<Vec<CandidateRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .context("Failed to parse CSV header row")?
        .clone();
    let columns = ColumnMap::from_headers(&headers, list_columns)?;

    let mut records = Vec::new();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let row = result.with_context(|| format!("Failed to parse CSV row {}", row_idx))?;
        records.push(record_from_row(&row, &columns));
    }

    Ok(records)
}

fn record_from_row(row: &csv::StringRecord, columns: &ColumnMap) -> CandidateRecord {
    let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(|s| s.to_string());

    CandidateRecord {
        name: cell(Some(columns.name)),
        brand: cell(Some(columns.brand)),
        price: cell(columns.price),
        age_group: cell(columns.age_group),
        food_type: cell(columns.food_type),
        description: cell(columns.description),
        ingredient_list: cell(columns.ingredient_list),
        image_url: cell(columns.image_url),
        shopping_url: cell(columns.shopping_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_columns() -> Vec<String> {
        crate::config::IngestConfig::default().list_columns
    }

    #[test]
    fn test_minimal_header() {
        let records = parse_csv_str("name,brand\nTuna Feast,Acme\n", &default_columns()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.as_deref(), Some("Tuna Feast"));
        assert_eq!(records[0].brand.as_deref(), Some("Acme"));
        assert_eq!(records[0].price, None);
    }

    #[test]
    fn test_missing_brand_header_is_fatal() {
        let err = parse_csv_str("name,price\nTuna Feast,3.50\n", &default_columns()).unwrap_err();
        assert!(err.to_string().contains("brand"));
    }

    #[test]
    fn test_full_ingredient_list_alias() {
        let csv = "name,brand,full_ingredient_list\nTuna Feast,Acme,\"Tuna, Water\"\n";
        let records = parse_csv_str(csv, &default_columns()).unwrap();
        assert_eq!(records[0].ingredient_list.as_deref(), Some("Tuna, Water"));
    }

    #[test]
    fn test_configured_list_column_name() {
        // A feed-specific header name recognized via [ingest].list_columns
        let csv = "name,brand,composition\nTuna Feast,Acme,\"Tuna, Water\"\n";
        let columns = vec!["composition".to_string()];
        let records = parse_csv_str(csv, &columns).unwrap();
        assert_eq!(records[0].ingredient_list.as_deref(), Some("Tuna, Water"));

        // The defaults no longer match once overridden
        let records = parse_csv_str(csv, &default_columns()).unwrap();
        assert_eq!(records[0].ingredient_list, None);
    }

    #[test]
    fn test_list_column_order_wins() {
        let csv = "name,brand,ingredients,composition\nTuna Feast,Acme,\"Tuna\",\"Beef\"\n";
        let columns = vec!["composition".to_string(), "ingredients".to_string()];
        let records = parse_csv_str(csv, &columns).unwrap();
        assert_eq!(records[0].ingredient_list.as_deref(), Some("Beef"));
    }

    #[test]
    fn test_all_optional_columns() {
        let csv = "name,brand,price,age_group,food_type,description,ingredients,image_url,shopping_url\n\
                   Tuna Feast,Acme,3.50,kitten,wet,Tasty.,\"Tuna, Water\",http://img,http://shop\n";
        let records = parse_csv_str(csv, &default_columns()).unwrap();
        let r = &records[0];
        assert_eq!(r.price.as_deref(), Some("3.50"));
        assert_eq!(r.age_group.as_deref(), Some("kitten"));
        assert_eq!(r.food_type.as_deref(), Some("wet"));
        assert_eq!(r.shopping_url.as_deref(), Some("http://shop"));
    }

    #[test]
    fn test_short_row_yields_absent_fields() {
        let csv = "name,brand,price\nTuna Feast\n";
        let records = parse_csv_str(csv, &default_columns()).unwrap();
        assert_eq!(records[0].name.as_deref(), Some("Tuna Feast"));
        assert_eq!(records[0].brand, None);
    }

    #[test]
    fn test_header_case_insensitive() {
        let records = parse_csv_str("Name,BRAND\nA,B\n", &default_columns()).unwrap();
        assert_eq!(records[0].name.as_deref(), Some("A"));
        assert_eq!(records[0].brand.as_deref(), Some("B"));
    }
}
