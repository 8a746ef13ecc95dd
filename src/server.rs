//! JSON HTTP API server.
//!
//! Exposes the catalog and the ingestion pipeline over HTTP for the admin
//! UI and programmatic clients.
//!
//! # Endpoints
//!
//! | Method   | Path | Description |
//! |----------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `GET`    | `/products` | List products (`age_group`, `food_type`, `brand`, `skip`, `limit`) |
//! | `GET`    | `/products/{id}` | Fetch a product with its ingredients |
//! | `DELETE` | `/products/{id}` | Explicit administrative delete |
//! | `GET`    | `/ingredients` | List ingredients (`skip`, `limit`) |
//! | `GET`    | `/ingredients/{id}` | Fetch an ingredient with its products |
//! | `POST`   | `/ingest/csv` | Ingest a CSV request body, returns the batch summary |
//!
//! # Error Contract
//!
//! All error responses use the shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "CSV header is missing required column: brand" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//! Row-level ingestion problems are never HTTP errors; they come back
//! inside the summary object. Only file-level malformation (missing
//! header, unreadable CSV) fails the request.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support the
//! browser-based admin UI.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::csv_source;
use crate::db;
use crate::ingest::{ingest_batch, IngestSummary};
use crate::ingredients;
use crate::models::IngestMode;
use crate::products::{self, ProductFilter};

/// Shared application state passed to all route handlers via Axum's
/// `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    pool: SqlitePool,
}

/// Starts the HTTP server.
///
/// Binds to the address configured in `[server].bind` and registers all
/// route handlers. Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let pool = db::connect(config).await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        pool,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/products", get(handle_list_products))
        .route(
            "/products/{id}",
            get(handle_get_product).delete(handle_delete_product),
        )
        .route("/ingredients", get(handle_list_ingredients))
        .route("/ingredients/{id}", get(handle_get_ingredient))
        .route("/ingest/csv", post(handle_ingest_csv))
        .layer(cors)
        .with_state(state);

    println!("API server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 404 Not Found error.
fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 error for query or storage failures.
fn internal(err: anyhow::Error) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: format!("{:#}", err),
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /products ============

/// Query parameters for product listing.
#[derive(Deserialize)]
struct ListProductsParams {
    age_group: Option<String>,
    food_type: Option<String>,
    brand: Option<String>,
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    100
}

async fn handle_list_products(
    State(state): State<AppState>,
    Query(params): Query<ListProductsParams>,
) -> Result<Json<Vec<products::ProductSummary>>, AppError> {
    if params.limit < 1 {
        return Err(bad_request("limit must be >= 1"));
    }

    let filter = ProductFilter {
        age_group: params.age_group,
        food_type: params.food_type,
        brand: params.brand,
        skip: params.skip.max(0),
        limit: params.limit,
    };

    let result = products::list_products(&state.pool, &filter)
        .await
        .map_err(internal)?;
    Ok(Json(result))
}

// ============ GET /products/{id} ============

async fn handle_get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<products::ProductDetail>, AppError> {
    let product = products::get_product(&state.pool, id)
        .await
        .map_err(internal)?;

    match product {
        Some(p) => Ok(Json(p)),
        None => Err(not_found(format!("product not found: {}", id))),
    }
}

// ============ DELETE /products/{id} ============

/// JSON response body for a successful delete.
#[derive(Serialize)]
struct DeleteResponse {
    deleted: bool,
    id: i64,
}

async fn handle_delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    let deleted = products::delete_product(&state.pool, id)
        .await
        .map_err(internal)?;

    if deleted {
        Ok(Json(DeleteResponse { deleted: true, id }))
    } else {
        Err(not_found(format!("product not found: {}", id)))
    }
}

// ============ GET /ingredients ============

/// Query parameters for ingredient listing.
#[derive(Deserialize)]
struct ListIngredientsParams {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

async fn handle_list_ingredients(
    State(state): State<AppState>,
    Query(params): Query<ListIngredientsParams>,
) -> Result<Json<Vec<crate::models::Ingredient>>, AppError> {
    if params.limit < 1 {
        return Err(bad_request("limit must be >= 1"));
    }

    let result = ingredients::list_ingredients(&state.pool, params.skip.max(0), params.limit)
        .await
        .map_err(internal)?;
    Ok(Json(result))
}

// ============ GET /ingredients/{id} ============

async fn handle_get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ingredients::IngredientDetail>, AppError> {
    let ingredient = ingredients::get_ingredient(&state.pool, id)
        .await
        .map_err(internal)?;

    match ingredient {
        Some(i) => Ok(Json(i)),
        None => Err(not_found(format!("ingredient not found: {}", id))),
    }
}

// ============ POST /ingest/csv ============

/// Query parameters for the CSV ingest endpoint.
#[derive(Deserialize)]
struct IngestParams {
    /// Duplicate-handling mode override: `update` or `skip`.
    /// Defaults to `[ingest].mode` from the config.
    mode: Option<String>,
}

/// Handler for `POST /ingest/csv`.
///
/// The request body is the raw CSV text. File-level malformation (missing
/// `name`/`brand` header, unparseable CSV) returns `400` before any row
/// is processed; everything else comes back as the batch summary, row
/// errors included.
async fn handle_ingest_csv(
    State(state): State<AppState>,
    Query(params): Query<IngestParams>,
    body: String,
) -> Result<Json<IngestSummary>, AppError> {
    let mode_str = params
        .mode
        .unwrap_or_else(|| state.config.ingest.mode.clone());
    let mode = IngestMode::parse(&mode_str)
        .ok_or_else(|| bad_request(format!("unknown ingest mode: {}", mode_str)))?;

    let records = csv_source::parse_csv_str(&body, &state.config.ingest.list_columns)
        .map_err(|e| bad_request(format!("{:#}", e)))?;

    let summary = ingest_batch(&state.pool, &records, mode)
        .await
        .map_err(internal)?;

    Ok(Json(summary))
}
