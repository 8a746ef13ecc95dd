//! # WhiskerDex CLI (`wdx`)
//!
//! The `wdx` binary is the primary interface for WhiskerDex. It provides
//! commands for database initialization, CSV ingestion, catalog browsing,
//! administrative deletion, and starting the JSON API server.
//!
//! ## Usage
//!
//! ```bash
//! wdx --config ./config/wdx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `wdx init` | Create the SQLite database and run schema migrations |
//! | `wdx ingest <csv>` | Merge a CSV batch into the catalog |
//! | `wdx products list` | List products with optional filters |
//! | `wdx products get <id>` | Show a product with its ingredients |
//! | `wdx products delete <id>` | Delete a product and its association rows |
//! | `wdx ingredients list` | List ingredients |
//! | `wdx ingredients get <id>` | Show an ingredient and the products listing it |
//! | `wdx stats` | Catalog overview |
//! | `wdx serve api` | Start the JSON API server |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! wdx init --config ./config/wdx.toml
//!
//! # Merge a CSV, skipping records that match existing products
//! wdx ingest data/products.csv --mode skip
//!
//! # Preview without writing
//! wdx ingest data/products.csv --dry-run
//!
//! # Browse the catalog
//! wdx products list --age-group kitten --food-type wet
//!
//! # Start the API server
//! wdx serve api --config ./config/wdx.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use whiskerdex::products::ProductFilter;
use whiskerdex::{config, ingest, ingredients, migrate, products, server, stats};

/// WhiskerDex CLI — a local-first cat food product catalog with CSV
/// ingestion and a JSON API.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/wdx.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "wdx",
    about = "WhiskerDex — a local-first cat food product catalog with CSV ingestion and a JSON API",
    version,
    long_about = "WhiskerDex merges heterogeneous product records (CSV uploads, programmatic \
    batches) into a SQLite catalog of products, ingredients, and their many-to-many associations, \
    and exposes the catalog via a CLI and a JSON HTTP server."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/wdx.toml`. Database, server, and ingestion
    /// settings are read from this file.
    #[arg(long, global = true, default_value = "./config/wdx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables
    /// (products, ingredients, product_ingredients) plus indexes.
    /// This command is idempotent — running it multiple times is safe.
    Init,

    /// Merge a CSV batch into the catalog.
    ///
    /// Normalizes each row, deduplicates against existing products
    /// (shopping URL first, then case-insensitive name+brand), resolves
    /// ingredient names via lookup-or-create, and links them. Row-level
    /// problems are reported in the summary and do not abort the batch.
    Ingest {
        /// Path to the CSV file. The header must contain at least
        /// `name` and `brand`.
        path: PathBuf,

        /// Duplicate handling: `update` (refresh the existing row) or
        /// `skip` (leave it untouched). Defaults to `[ingest].mode`.
        #[arg(long)]
        mode: Option<String>,

        /// Parse and validate only — show row and ingredient counts
        /// without writing to the database.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of rows to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Browse and administer products.
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },

    /// Browse ingredients.
    Ingredients {
        #[command(subcommand)]
        action: IngredientsAction,
    },

    /// Show catalog statistics.
    ///
    /// Product/ingredient/association counts and a per-food-type
    /// breakdown. Useful for verifying that an import landed.
    Stats,

    /// Start the JSON API server.
    ///
    /// Exposes the catalog and the CSV ingest endpoint over HTTP for the
    /// admin UI and programmatic clients.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

/// Product subcommands.
#[derive(Subcommand)]
enum ProductsAction {
    /// List products with optional filters.
    List {
        /// Filter by age group (e.g., `kitten`, `adult`, `senior`).
        #[arg(long)]
        age_group: Option<String>,

        /// Filter by food type (e.g., `wet`, `dry`, `snack`).
        #[arg(long)]
        food_type: Option<String>,

        /// Filter by brand (case-insensitive exact match).
        #[arg(long)]
        brand: Option<String>,

        /// Number of rows to skip.
        #[arg(long, default_value_t = 0)]
        skip: i64,

        /// Maximum number of rows to return.
        #[arg(long, default_value_t = 100)]
        limit: i64,
    },
    /// Show a product with its linked ingredients.
    Get {
        /// Product id.
        id: i64,
    },
    /// Delete a product and its association rows.
    ///
    /// Deletion is an explicit administrative action; ingestion never
    /// deletes products. Shared ingredients are left in place.
    Delete {
        /// Product id.
        id: i64,
    },
}

/// Ingredient subcommands.
#[derive(Subcommand)]
enum IngredientsAction {
    /// List ingredients.
    List {
        /// Number of rows to skip.
        #[arg(long, default_value_t = 0)]
        skip: i64,

        /// Maximum number of rows to return.
        #[arg(long, default_value_t = 100)]
        limit: i64,
    },
    /// Show an ingredient and the products that list it.
    Get {
        /// Ingredient id.
        id: i64,
    },
}

/// Server subcommands.
#[derive(Subcommand)]
enum ServeService {
    /// Start the JSON API server.
    ///
    /// Binds to the address configured in `[server].bind` and serves
    /// the catalog endpoints.
    Api,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest {
            path,
            mode,
            dry_run,
            limit,
        } => {
            ingest::run_import(&cfg, &path, mode.as_deref(), dry_run, limit).await?;
        }
        Commands::Products { action } => match action {
            ProductsAction::List {
                age_group,
                food_type,
                brand,
                skip,
                limit,
            } => {
                let filter = ProductFilter {
                    age_group,
                    food_type,
                    brand,
                    skip,
                    limit,
                };
                products::run_list(&cfg, &filter).await?;
            }
            ProductsAction::Get { id } => {
                products::run_get(&cfg, id).await?;
            }
            ProductsAction::Delete { id } => {
                products::run_delete(&cfg, id).await?;
            }
        },
        Commands::Ingredients { action } => match action {
            IngredientsAction::List { skip, limit } => {
                ingredients::run_list(&cfg, skip, limit).await?;
            }
            IngredientsAction::Get { id } => {
                ingredients::run_get(&cfg, id).await?;
            }
        },
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve { service } => match service {
            ServeService::Api => {
                server::run_server(&cfg).await?;
            }
        },
    }

    Ok(())
}
