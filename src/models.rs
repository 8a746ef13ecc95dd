//! Core data models used throughout WhiskerDex.
//!
//! These types represent the candidate records, products, and ingredients
//! that flow through the ingestion pipeline and the catalog queries.

use serde::Serialize;

/// Raw candidate row produced by an input source (CSV upload, programmatic
/// batch) before normalization. Every field is optional at this stage;
/// validation of the mandatory fields happens at the ingestion boundary.
#[derive(Debug, Clone, Default)]
pub struct CandidateRecord {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub price: Option<String>,
    pub age_group: Option<String>,
    pub food_type: Option<String>,
    pub description: Option<String>,
    pub ingredient_list: Option<String>,
    pub image_url: Option<String>,
    pub shopping_url: Option<String>,
}

/// A candidate that passed normalization: mandatory fields are present and
/// non-empty, optional fields are coerced to `None` when blank, the price
/// is parsed, and the raw ingredient list is split into deduplicated names.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub name: String,
    pub brand: String,
    pub price: Option<f64>,
    pub age_group: Option<String>,
    pub food_type: Option<String>,
    pub description: Option<String>,
    /// Raw ingredient text, kept verbatim on the product row.
    pub ingredient_list: Option<String>,
    /// Trimmed, case-insensitively deduplicated ingredient names, in
    /// first-occurrence order.
    pub ingredients: Vec<String>,
    pub image_url: Option<String>,
    pub shopping_url: Option<String>,
}

/// Ingredient row as stored in SQLite. Shared across all products that
/// list it; the name is unique case-insensitively.
#[derive(Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Open key-value map, e.g. `{"protein": "10%"}`.
    pub nutritional_value: serde_json::Value,
    /// Set of allergen names, e.g. `["chicken", "grain"]`.
    pub common_allergens: serde_json::Value,
}

/// How the pipeline treats a candidate that matches an existing product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Refresh the existing row (present fields overwrite, absent fields
    /// are left alone) and replace its association set.
    Update,
    /// Leave the existing row untouched and count the candidate as a
    /// skipped duplicate.
    Skip,
}

impl IngestMode {
    pub fn parse(s: &str) -> Option<IngestMode> {
        match s {
            "update" => Some(IngestMode::Update),
            "skip" => Some(IngestMode::Skip),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IngestMode::Update => "update",
            IngestMode::Skip => "skip",
        }
    }
}
