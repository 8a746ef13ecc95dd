use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7400".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Default duplicate-handling mode: `update` or `skip`.
    /// Overridable per run with `wdx ingest --mode`.
    #[serde(default = "default_mode")]
    pub mode: String,

    /// CSV header names recognized as the ingredient-list column, matched
    /// case-insensitively in order.
    #[serde(default = "default_list_columns")]
    pub list_columns: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            list_columns: default_list_columns(),
        }
    }
}

fn default_mode() -> String {
    "update".to_string()
}

fn default_list_columns() -> Vec<String> {
    vec!["ingredients".to_string(), "full_ingredient_list".to_string()]
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if crate::models::IngestMode::parse(&config.ingest.mode).is_none() {
        anyhow::bail!(
            "Unknown ingest mode: '{}'. Must be update or skip.",
            config.ingest.mode
        );
    }

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    if config.ingest.list_columns.is_empty() {
        anyhow::bail!("ingest.list_columns must name at least one column");
    }

    Ok(config)
}
