//! Candidate record normalization.
//!
//! The single normalization boundary for all input sources: CSV uploads,
//! the HTTP ingest endpoint, and programmatic batches all pass through
//! [`normalize_record`] before the pipeline looks at them. Whitespace is
//! trimmed, blank optional fields become absent, an unparseable price
//! becomes absent, and the raw ingredient text is split into a
//! deduplicated, ordered list of names.

use crate::models::{CandidateRecord, NormalizedRecord};

/// Normalize a raw candidate. Returns `Err(reason)` when a mandatory field
/// (name, brand) is missing or empty after trimming; the reason is recorded
/// as a row-level error by the caller.
pub fn normalize_record(record: &CandidateRecord) -> Result<NormalizedRecord, String> {
    let name = clean(record.name.as_deref())
        .ok_or_else(|| "missing required field: name".to_string())?;
    let brand = clean(record.brand.as_deref())
        .ok_or_else(|| "missing required field: brand".to_string())?;

    let ingredient_list = clean(record.ingredient_list.as_deref());
    let ingredients = ingredient_list
        .as_deref()
        .map(split_ingredient_list)
        .unwrap_or_default();

    Ok(NormalizedRecord {
        name,
        brand,
        price: record.price.as_deref().and_then(parse_price),
        age_group: clean(record.age_group.as_deref()),
        food_type: clean(record.food_type.as_deref()),
        description: clean(record.description.as_deref()),
        ingredient_list,
        ingredients,
        image_url: clean(record.image_url.as_deref()),
        shopping_url: clean(record.shopping_url.as_deref()),
    })
}

/// Trim a raw field, coercing empty strings to absent.
fn clean(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a price field. Anything that fails numeric parsing is treated as
/// absent, not a hard error. A leading currency sign is tolerated since
/// scraped feeds often include one.
fn parse_price(raw: &str) -> Option<f64> {
    let s = raw.trim().trim_start_matches('$').trim();
    s.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Split a raw comma-separated ingredient string into trimmed names,
/// dropping empties and case-insensitive duplicates (ASCII folding, to
/// match the store's `NOCASE` collation) while preserving
/// first-occurrence order and casing.
pub fn split_ingredient_list(raw: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut names: Vec<String> = Vec::new();

    for part in raw.split(',') {
        let name = part.trim();
        if name.is_empty() {
            continue;
        }
        let key = name.to_ascii_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        names.push(name.to_string());
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, brand: &str) -> CandidateRecord {
        CandidateRecord {
            name: Some(name.to_string()),
            brand: Some(brand.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_mandatory_fields_trimmed() {
        let mut rec = raw("  Tuna Feast  ", " Acme ");
        rec.description = Some("   ".to_string());
        let norm = normalize_record(&rec).unwrap();
        assert_eq!(norm.name, "Tuna Feast");
        assert_eq!(norm.brand, "Acme");
        assert_eq!(norm.description, None);
    }

    #[test]
    fn test_missing_name_rejected() {
        let rec = CandidateRecord {
            brand: Some("Acme".to_string()),
            ..Default::default()
        };
        let err = normalize_record(&rec).unwrap_err();
        assert!(err.contains("name"));
    }

    #[test]
    fn test_blank_brand_rejected() {
        let rec = raw("Tuna Feast", "   ");
        let err = normalize_record(&rec).unwrap_err();
        assert!(err.contains("brand"));
    }

    #[test]
    fn test_unparseable_price_is_absent() {
        let mut rec = raw("A", "B");
        rec.price = Some("around ten bucks".to_string());
        let norm = normalize_record(&rec).unwrap();
        assert_eq!(norm.price, None);
    }

    #[test]
    fn test_price_with_currency_sign() {
        let mut rec = raw("A", "B");
        rec.price = Some("$12.99".to_string());
        let norm = normalize_record(&rec).unwrap();
        assert_eq!(norm.price, Some(12.99));
    }

    #[test]
    fn test_ingredient_split_dedupes_case_insensitively() {
        let names = split_ingredient_list("Tuna, Water, Tuna , water,  ");
        assert_eq!(names, vec!["Tuna", "Water"]);
    }

    #[test]
    fn test_ingredient_dedup_folds_ascii_only() {
        // Matches the ASCII-only NOCASE folding the store applies
        let names = split_ingredient_list("Café, CAFÉ, CAFé");
        assert_eq!(names, vec!["Café", "CAFÉ"]);
    }

    #[test]
    fn test_empty_ingredient_list_is_valid() {
        let mut rec = raw("A", "B");
        rec.ingredient_list = Some("".to_string());
        let norm = normalize_record(&rec).unwrap();
        assert_eq!(norm.ingredient_list, None);
        assert!(norm.ingredients.is_empty());
    }

    #[test]
    fn test_order_preserved() {
        let names = split_ingredient_list("Chicken, Rice, Chicken Fat, rice");
        assert_eq!(names, vec!["Chicken", "Rice", "Chicken Fat"]);
    }
}
