//! End-to-end tests driving the compiled `wdx` binary against a temp
//! directory environment: init, CSV ingestion, catalog browsing, stats.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn wdx_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("wdx");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    // Create a CSV fixture: two valid rows and one missing its brand
    fs::write(
        root.join("products.csv"),
        "name,brand,price,age_group,food_type,ingredients,shopping_url\n\
         Tuna Feast,Acme,3.50,kitten,wet,\"Tuna, Water, Tuna \",https://shop.example/tf-1\n\
         Crunchy Bites,Purrfect,12.99,adult,dry,\"Chicken, Rice\",\n\
         No Brand Snack,,1.00,adult,snack,\"Salmon\",\n",
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/wdx.sqlite"

[server]
bind = "127.0.0.1:7431"

[ingest]
mode = "update"
"#,
        root.display()
    );

    let config_path = config_dir.join("wdx.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_wdx(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = wdx_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run wdx binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn csv_path(config_path: &Path) -> String {
    // config lives at <root>/config/wdx.toml; the fixture at <root>/products.csv
    let root = config_path.parent().unwrap().parent().unwrap();
    root.join("products.csv").to_str().unwrap().to_string()
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_wdx(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_wdx(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_wdx(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_ingest_csv_with_row_error() {
    let (_tmp, config_path) = setup_test_env();
    let csv = csv_path(&config_path);

    run_wdx(&config_path, &["init"]);
    let (stdout, stderr, success) = run_wdx(&config_path, &["ingest", &csv]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("products created: 2"));
    assert!(stdout.contains("ingredients created: 4"));
    assert!(stdout.contains("row 2:"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_ingest_idempotent() {
    let (_tmp, config_path) = setup_test_env();
    let csv = csv_path(&config_path);

    run_wdx(&config_path, &["init"]);
    run_wdx(&config_path, &["ingest", &csv]);

    let (stdout, _, success) = run_wdx(&config_path, &["ingest", &csv]);
    assert!(success);
    assert!(stdout.contains("products created: 0"));
    assert!(stdout.contains("products updated: 2"));
    assert!(stdout.contains("ingredients created: 0"));
}

#[test]
fn test_ingest_skip_mode() {
    let (_tmp, config_path) = setup_test_env();
    let csv = csv_path(&config_path);

    run_wdx(&config_path, &["init"]);
    run_wdx(&config_path, &["ingest", &csv]);

    let (stdout, _, success) = run_wdx(&config_path, &["ingest", &csv, "--mode", "skip"]);
    assert!(success);
    assert!(stdout.contains("duplicates skipped: 2"));
    assert!(stdout.contains("products updated: 0"));
}

#[test]
fn test_ingest_dry_run_writes_nothing() {
    let (_tmp, config_path) = setup_test_env();
    let csv = csv_path(&config_path);

    run_wdx(&config_path, &["init"]);
    let (stdout, _, success) = run_wdx(&config_path, &["ingest", &csv, "--dry-run"]);
    assert!(success);
    assert!(stdout.contains("dry-run"));
    assert!(stdout.contains("rows found: 3"));
    assert!(stdout.contains("valid rows: 2"));

    let (stdout, _, _) = run_wdx(&config_path, &["products", "list"]);
    assert!(stdout.contains("No products found."));
}

#[test]
fn test_ingest_dry_run_limit_reports_full_row_count() {
    let (_tmp, config_path) = setup_test_env();
    let csv = csv_path(&config_path);

    run_wdx(&config_path, &["init"]);
    let (stdout, _, success) =
        run_wdx(&config_path, &["ingest", &csv, "--dry-run", "--limit", "1"]);
    assert!(success);
    // The file has 3 rows; the limit caps what gets analyzed, not the count
    assert!(stdout.contains("rows found: 3"));
    assert!(stdout.contains("valid rows: 1"));
}

#[test]
fn test_ingest_custom_list_column() {
    let (tmp, config_path) = setup_test_env();

    // A feed whose ingredient cell uses its own header name, recognized
    // via [ingest] list_columns
    let csv = tmp.path().join("composition.csv");
    fs::write(
        &csv,
        "name,brand,composition\nTuna Feast,Acme,\"Tuna, Water\"\n",
    )
    .unwrap();

    let config_content = fs::read_to_string(&config_path).unwrap();
    fs::write(
        &config_path,
        format!("{}list_columns = [\"composition\"]\n", config_content),
    )
    .unwrap();

    run_wdx(&config_path, &["init"]);
    let (stdout, stderr, success) = run_wdx(&config_path, &["ingest", csv.to_str().unwrap()]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("products created: 1"));
    assert!(stdout.contains("ingredients created: 2"));
}

#[test]
fn test_missing_header_is_fatal() {
    let (tmp, config_path) = setup_test_env();

    let bad_csv = tmp.path().join("bad.csv");
    fs::write(&bad_csv, "name,price\nTuna Feast,3.50\n").unwrap();

    run_wdx(&config_path, &["init"]);
    let (_, stderr, success) = run_wdx(&config_path, &["ingest", bad_csv.to_str().unwrap()]);
    assert!(!success, "ingest of a headerless CSV should fail");
    assert!(stderr.contains("brand"));
}

#[test]
fn test_products_list_and_get() {
    let (_tmp, config_path) = setup_test_env();
    let csv = csv_path(&config_path);

    run_wdx(&config_path, &["init"]);
    run_wdx(&config_path, &["ingest", &csv]);

    let (stdout, _, success) = run_wdx(&config_path, &["products", "list"]);
    assert!(success);
    assert!(stdout.contains("Tuna Feast"));
    assert!(stdout.contains("Crunchy Bites"));
    assert!(stdout.contains("2 product(s)"));

    let (stdout, _, success) = run_wdx(
        &config_path,
        &["products", "list", "--food-type", "wet"],
    );
    assert!(success);
    assert!(stdout.contains("Tuna Feast"));
    assert!(!stdout.contains("Crunchy Bites"));

    let (stdout, _, success) = run_wdx(&config_path, &["products", "get", "1"]);
    assert!(success);
    assert!(stdout.contains("Tuna Feast"));
    assert!(stdout.contains("Ingredients (2)"));
}

#[test]
fn test_products_delete() {
    let (_tmp, config_path) = setup_test_env();
    let csv = csv_path(&config_path);

    run_wdx(&config_path, &["init"]);
    run_wdx(&config_path, &["ingest", &csv]);

    let (stdout, _, success) = run_wdx(&config_path, &["products", "delete", "1"]);
    assert!(success);
    assert!(stdout.contains("deleted"));

    let (_, stderr, success) = run_wdx(&config_path, &["products", "get", "1"]);
    assert!(!success);
    assert!(stderr.contains("not found"));

    // Shared ingredients survive the delete
    let (stdout, _, _) = run_wdx(&config_path, &["ingredients", "list"]);
    assert!(stdout.contains("Tuna"));
}

#[test]
fn test_ingredients_list_and_get() {
    let (_tmp, config_path) = setup_test_env();
    let csv = csv_path(&config_path);

    run_wdx(&config_path, &["init"]);
    run_wdx(&config_path, &["ingest", &csv]);

    let (stdout, _, success) = run_wdx(&config_path, &["ingredients", "list"]);
    assert!(success);
    assert!(stdout.contains("Tuna"));
    assert!(stdout.contains("Water"));
    assert!(stdout.contains("4 ingredient(s)"));

    let (stdout, _, success) = run_wdx(&config_path, &["ingredients", "get", "1"]);
    assert!(success);
    assert!(stdout.contains("Listed by (1)"));
}

#[test]
fn test_stats() {
    let (_tmp, config_path) = setup_test_env();
    let csv = csv_path(&config_path);

    run_wdx(&config_path, &["init"]);
    run_wdx(&config_path, &["ingest", &csv]);

    let (stdout, _, success) = run_wdx(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Products:     2"));
    assert!(stdout.contains("Ingredients:  4"));
    assert!(stdout.contains("Associations: 4"));
}

#[test]
fn test_unknown_mode_rejected() {
    let (_tmp, config_path) = setup_test_env();
    let csv = csv_path(&config_path);

    run_wdx(&config_path, &["init"]);
    let (_, stderr, success) = run_wdx(&config_path, &["ingest", &csv, "--mode", "merge"]);
    assert!(!success);
    assert!(stderr.contains("mode"));
}
