use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::models::CatalogType;
use crate::region::Region;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub catalogs: Vec<CatalogConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Reload every catalog on this period. Disabled when absent.
    #[serde(default)]
    pub refresh_interval_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            refresh_interval_secs: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub maintainer: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(rename = "type", default = "default_catalog_type")]
    pub catalog_type: CatalogType,
    pub location: String,
    #[serde(default)]
    pub excluded_charts: Vec<String>,
}

fn default_status() -> String {
    "PROD".to_string()
}

fn default_catalog_type() -> CatalogType {
    CatalogType::Helm
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.catalogs.is_empty() {
        bail!("at least one [[catalogs]] entry is required");
    }

    let mut ids = HashSet::new();
    for catalog in &config.catalogs {
        if catalog.id.trim().is_empty() {
            bail!("catalogs.id must not be empty");
        }
        if !ids.insert(catalog.id.as_str()) {
            bail!("duplicate catalog id: '{}'", catalog.id);
        }
        if catalog.location.trim().is_empty() {
            bail!("catalogs.location must not be empty (catalog '{}')", catalog.id);
        }
    }

    let mut region_ids = HashSet::new();
    for region in &config.regions {
        if !region_ids.insert(region.id.as_str()) {
            bail!("duplicate region id: '{}'", region.id);
        }
    }

    if config.fetch.timeout_secs == 0 {
        bail!("fetch.timeout_secs must be > 0");
    }

    if config.server.refresh_interval_secs == Some(0) {
        bail!("server.refresh_interval_secs must be > 0 when set");
    }

    Ok(())
}
