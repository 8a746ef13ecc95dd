//! # WhiskerDex
//!
//! A local-first cat food product catalog with CSV ingestion and a JSON API.
//!
//! WhiskerDex merges heterogeneous product records (CSV uploads, programmatic
//! batches) into a SQLite catalog of products, ingredients, and their
//! many-to-many associations, deduplicating products by shopping URL or
//! case-insensitive (name, brand) and resolving ingredient names to one
//! shared row each.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────┐
//! │   Sources    │──▶│   Pipeline    │──▶│  SQLite   │
//! │ CSV / batch │   │ Normalize+    │   │ products  │
//! └─────────────┘   │ Dedup+Link   │   │ +ingreds  │
//!                   └──────────────┘   └────┬──────┘
//!                                           │
//!                       ┌───────────────────┤
//!                       ▼                   ▼
//!                  ┌──────────┐       ┌──────────┐
//!                  │   CLI    │       │   HTTP   │
//!                  │  (wdx)   │       │  (JSON)  │
//!                  └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! wdx init                       # create database
//! wdx ingest products.csv        # merge a CSV batch into the catalog
//! wdx products list --food-type wet
//! wdx ingredients list
//! wdx stats
//! wdx serve api                  # start the JSON API server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`normalize`] | Candidate record normalization |
//! | [`csv_source`] | CSV input source |
//! | [`ingest`] | Ingestion pipeline (dedup, lookup-or-create, linking) |
//! | [`products`] | Product catalog queries and admin delete |
//! | [`ingredients`] | Ingredient catalog queries |
//! | [`stats`] | Catalog statistics |
//! | [`server`] | JSON HTTP API server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod csv_source;
pub mod db;
pub mod ingest;
pub mod ingredients;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod products;
pub mod server;
pub mod stats;
