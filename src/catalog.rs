//! In-memory catalog state.
//!
//! A [`CatalogWrapper`] is created from configuration with an empty
//! [`CatalogSnapshot`]. Each successful load builds a complete new snapshot
//! and swaps it in under a write lock, so readers always see a consistent
//! `entries`/`packages` pair: either the previous one or the new one.
//!
//! ```text
//! CatalogWrapper
//!   id, type, location, excluded charts   (from config, immutable)
//!   load lock                             (one load at a time)
//!   RwLock<Arc<CatalogSnapshot>>          (swapped on commit)
//!        ├── entries:  chart → [versions]
//!        ├── packages: one per chart
//!        └── last_update_time
//! ```

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::CatalogConfig;
use crate::models::{name_key, CatalogType, Chart, Package, Pkg};
use crate::provider::join_location;

const HELM_INDEX_FILE: &str = "index.yaml";

/// Resolved catalog contents at one point in time. Never mutated after
/// construction.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub entries: IndexMap<String, Vec<Chart>>,
    pub packages: Vec<Package>,
    pub last_update_time: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    /// Builds a snapshot from chart groups, deriving one package per group
    /// from its first version. Empty groups are dropped.
    pub fn from_entries(entries: IndexMap<String, Vec<Chart>>, updated: DateTime<Utc>) -> Self {
        let entries: IndexMap<String, Vec<Chart>> = entries
            .into_iter()
            .filter(|(_, versions)| !versions.is_empty())
            .collect();
        let packages = entries
            .values()
            .filter_map(|versions| versions.first())
            .map(|chart| Package::Chart(chart.clone()))
            .collect();
        Self {
            entries,
            packages,
            last_update_time: Some(updated),
        }
    }

    /// Builds a snapshot for a catalog that only has minimal packages.
    pub fn from_packages(packages: Vec<Pkg>, updated: DateTime<Utc>) -> Self {
        Self {
            entries: IndexMap::new(),
            packages: packages.into_iter().map(Package::Pkg).collect(),
            last_update_time: Some(updated),
        }
    }

    pub fn find_package(&self, name: &str) -> Option<&Package> {
        let key = name_key(name);
        self.packages.iter().find(|p| name_key(p.name()) == key)
    }

    pub fn find_charts(&self, name: &str) -> Option<&Vec<Chart>> {
        if let Some(versions) = self.entries.get(name) {
            return Some(versions);
        }
        let key = name_key(name);
        self.entries
            .iter()
            .find(|(chart, _)| name_key(chart) == key)
            .map(|(_, versions)| versions)
    }

    pub fn version_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

/// One configured catalog source and its latest resolved snapshot.
#[derive(Debug)]
pub struct CatalogWrapper {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub maintainer: Option<String>,
    pub status: String,
    pub catalog_type: CatalogType,
    pub location: String,
    pub excluded_charts: Vec<String>,
    excluded: HashSet<String>,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
    load_lock: Mutex<()>,
}

impl CatalogWrapper {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            description: config.description.clone(),
            maintainer: config.maintainer.clone(),
            status: config.status.clone(),
            catalog_type: config.catalog_type,
            location: config.location.clone(),
            excluded_charts: config.excluded_charts.clone(),
            excluded: config.excluded_charts.iter().map(|n| name_key(n)).collect(),
            snapshot: RwLock::new(Arc::new(CatalogSnapshot::default())),
            load_lock: Mutex::new(()),
        }
    }

    /// Whether a chart name is on the exclusion list (case-insensitive).
    pub fn is_excluded(&self, chart: &str) -> bool {
        self.excluded.contains(&name_key(chart))
    }

    /// Location of the document the loader fetches first.
    ///
    /// For Helm catalogs a location that already names a YAML file is used
    /// as is; otherwise `index.yaml` is appended.
    pub fn index_location(&self) -> String {
        match self.catalog_type {
            CatalogType::Helm => {
                let lower = self.location.to_ascii_lowercase();
                if lower.ends_with(".yaml") || lower.ends_with(".yml") {
                    self.location.clone()
                } else {
                    join_location(&self.location, HELM_INDEX_FILE)
                }
            }
            CatalogType::Universe => self.location.clone(),
        }
    }

    /// Current snapshot. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.read().clone()
    }

    /// Replaces the snapshot in a single swap.
    pub(crate) fn commit(&self, snapshot: CatalogSnapshot) {
        *self.snapshot.write() = Arc::new(snapshot);
    }

    /// Held for the whole duration of a load.
    pub(crate) fn lock_for_load(&self) -> MutexGuard<'_, ()> {
        self.load_lock.lock()
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            maintainer: self.maintainer.clone(),
            location: self.location.clone(),
            status: self.status.clone(),
            catalog_type: self.catalog_type,
            excluded_charts: self.excluded_charts.clone(),
            last_update_time: self.snapshot().last_update_time,
        }
    }

    pub fn detail(&self) -> CatalogDetail {
        let snapshot = self.snapshot();
        CatalogDetail {
            summary: self.summary(),
            entries: snapshot.entries.clone(),
            packages: snapshot.packages.clone(),
        }
    }
}

/// Catalog metadata without package bodies (listing endpoint).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,
    pub location: String,
    pub status: String,
    #[serde(rename = "type")]
    pub catalog_type: CatalogType,
    pub excluded_charts: Vec<String>,
    pub last_update_time: Option<DateTime<Utc>>,
}

/// Full catalog contents (catalog-by-id endpoint).
#[derive(Debug, Clone, Serialize)]
pub struct CatalogDetail {
    #[serde(flatten)]
    pub summary: CatalogSummary,
    pub entries: IndexMap<String, Vec<Chart>>,
    pub packages: Vec<Package>,
}
