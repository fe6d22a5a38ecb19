//! Catalog registry: owns the configured catalogs and answers lookups.
//!
//! Lookups return owned copies of packages and charts, so callers can
//! augment them without touching the shared snapshot.

use std::sync::Arc;

use crate::catalog::CatalogWrapper;
use crate::config::{CatalogConfig, Config};
use crate::error::{CatalogError, LoadError, NotFound};
use crate::loader::{CatalogLoader, LoadReport};
use crate::models::{Chart, Package};
use crate::provider::{DefaultProvider, ResourceProvider};

pub struct CatalogService {
    loader: CatalogLoader,
    catalogs: Vec<Arc<CatalogWrapper>>,
}

impl CatalogService {
    /// Creates a service with empty catalogs. Nothing is fetched until
    /// [`load_all`](Self::load_all) or [`refresh`](Self::refresh).
    pub fn new(catalogs: &[CatalogConfig], provider: Arc<dyn ResourceProvider>) -> Self {
        Self {
            loader: CatalogLoader::new(provider),
            catalogs: catalogs
                .iter()
                .map(|c| Arc::new(CatalogWrapper::new(c)))
                .collect(),
        }
    }

    /// Service backed by the default filesystem/HTTP provider.
    pub fn from_config(config: &Config) -> Self {
        let provider = Arc::new(DefaultProvider::new(config.fetch.timeout()));
        Self::new(&config.catalogs, provider)
    }

    /// Loads every catalog. A catalog whose index cannot be loaded is
    /// logged and keeps its previous contents; the others still load.
    pub fn load_all(&self) -> Vec<Result<LoadReport, LoadError>> {
        self.catalogs
            .iter()
            .map(|catalog| self.load(catalog))
            .collect()
    }

    /// Reloads a single catalog.
    pub fn refresh(&self, catalog_id: &str) -> Result<LoadReport, CatalogError> {
        let catalog = self.get_catalog_by_id(catalog_id)?;
        Ok(self.load(&catalog)?)
    }

    fn load(&self, catalog: &CatalogWrapper) -> Result<LoadReport, LoadError> {
        let result = self.loader.update_catalog(catalog);
        if let Err(err) = &result {
            tracing::error!(
                catalog = %err.catalog(),
                location = %err.location(),
                "catalog load failed: {}",
                err
            );
        }
        result
    }

    pub fn get_catalogs(&self) -> &[Arc<CatalogWrapper>] {
        &self.catalogs
    }

    pub fn get_catalog_by_id(&self, catalog_id: &str) -> Result<Arc<CatalogWrapper>, NotFound> {
        self.catalogs
            .iter()
            .find(|c| c.id == catalog_id)
            .cloned()
            .ok_or_else(|| NotFound::Catalog(catalog_id.to_string()))
    }

    /// Package by name (case-insensitive).
    pub fn get_package(&self, catalog_id: &str, name: &str) -> Result<Package, NotFound> {
        let snapshot = self.get_catalog_by_id(catalog_id)?.snapshot();
        snapshot
            .find_package(name)
            .cloned()
            .ok_or_else(|| NotFound::Package {
                catalog: catalog_id.to_string(),
                name: name.to_string(),
            })
    }

    /// One version of a chart. The chart name matches case-insensitively,
    /// the version exactly.
    pub fn get_chart_by_version(
        &self,
        catalog_id: &str,
        chart_name: &str,
        version: &str,
    ) -> Result<Chart, NotFound> {
        let versions = self.get_charts(catalog_id, chart_name)?;
        versions
            .into_iter()
            .find(|chart| chart.version == version)
            .ok_or_else(|| NotFound::Version {
                catalog: catalog_id.to_string(),
                chart: chart_name.to_string(),
                version: version.to_string(),
            })
    }

    /// Every version of a chart, in index order.
    pub fn get_charts(&self, catalog_id: &str, chart_name: &str) -> Result<Vec<Chart>, NotFound> {
        let snapshot = self.get_catalog_by_id(catalog_id)?.snapshot();
        snapshot
            .find_charts(chart_name)
            .cloned()
            .ok_or_else(|| NotFound::Chart {
                catalog: catalog_id.to_string(),
                chart: chart_name.to_string(),
            })
    }
}
