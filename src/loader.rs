//! Catalog loading.
//!
//! [`CatalogLoader::update_catalog`] rebuilds one catalog from scratch:
//!
//! 1. Fetch the index document. Failure here aborts the load and leaves
//!    the wrapper untouched ([`LoadError`]).
//! 2. Parse it into chart groups (document order, duplicates merged).
//! 3. Drop excluded groups.
//! 4. Fetch, verify and decode each version's bundle. A failing version
//!    is logged and skipped ([`RecordError`]); the others still load.
//! 5. Commit the new snapshot in one swap.

use chrono::Utc;
use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::catalog::{CatalogSnapshot, CatalogWrapper};
use crate::error::{FetchError, LoadError, ParseError, RecordError, RecordFailure};
use crate::index::{parse_bundle, parse_index, parse_packages};
use crate::models::{CatalogType, Chart};
use crate::provider::{join_location, parent_location, ResourceProvider};

/// Outcome of a successful load.
#[derive(Debug)]
pub struct LoadReport {
    pub catalog: String,
    /// Chart groups (or packages, for universe catalogs) committed.
    pub charts: usize,
    /// Chart versions committed.
    pub versions: usize,
    /// Versions that were skipped, with the reason.
    pub failures: Vec<RecordError>,
}

/// Populates [`CatalogWrapper`]s from a [`ResourceProvider`].
#[derive(Clone)]
pub struct CatalogLoader {
    provider: Arc<dyn ResourceProvider>,
}

impl CatalogLoader {
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self { provider }
    }

    /// Rebuilds `wrapper` and commits the result.
    ///
    /// Concurrent calls on the same wrapper are serialized. Readers keep
    /// seeing the previous snapshot until the commit.
    pub fn update_catalog(&self, wrapper: &CatalogWrapper) -> Result<LoadReport, LoadError> {
        let _guard = wrapper.lock_for_load();

        let location = wrapper.index_location();
        tracing::debug!(catalog = %wrapper.id, location = %location, "fetching catalog index");

        let bytes = self
            .provider
            .fetch(&location)
            .map_err(|source| LoadError::Fetch {
                catalog: wrapper.id.clone(),
                location: location.clone(),
                source,
            })?;

        let (snapshot, failures) = match wrapper.catalog_type {
            CatalogType::Helm => self.resolve_helm(wrapper, &location, &bytes)?,
            CatalogType::Universe => resolve_universe(wrapper, &location, &bytes)?,
        };

        let report = LoadReport {
            catalog: wrapper.id.clone(),
            charts: snapshot.packages.len(),
            versions: snapshot.version_count(),
            failures,
        };
        wrapper.commit(snapshot);

        tracing::info!(
            catalog = %wrapper.id,
            charts = report.charts,
            versions = report.versions,
            failures = report.failures.len(),
            "catalog loaded"
        );
        Ok(report)
    }

    fn resolve_helm(
        &self,
        wrapper: &CatalogWrapper,
        location: &str,
        bytes: &[u8],
    ) -> Result<(CatalogSnapshot, Vec<RecordError>), LoadError> {
        let index = parse_index(bytes).map_err(|source| parse_error(wrapper, location, source))?;
        let base = parent_location(location);

        let mut entries: IndexMap<String, Vec<Chart>> = IndexMap::new();
        let mut failures = Vec::new();

        for (name, versions) in index.entries {
            if wrapper.is_excluded(&name) {
                tracing::debug!(catalog = %wrapper.id, chart = %name, "chart excluded");
                continue;
            }

            let mut resolved = Vec::with_capacity(versions.len());
            for chart in versions {
                match self.resolve_chart(wrapper, base, location, chart) {
                    Ok(chart) => resolved.push(chart),
                    Err(err) => {
                        tracing::error!(
                            catalog = %err.catalog,
                            chart = %err.chart,
                            version = %err.version,
                            resource = %err.resource,
                            "{}",
                            err
                        );
                        failures.push(err);
                    }
                }
            }
            entries.insert(name, resolved);
        }

        Ok((CatalogSnapshot::from_entries(entries, Utc::now()), failures))
    }

    /// Completes one index record from its bundle.
    fn resolve_chart(
        &self,
        wrapper: &CatalogWrapper,
        base: &str,
        index_location: &str,
        mut chart: Chart,
    ) -> Result<Chart, RecordError> {
        let fail = |resource: &str, failure: RecordFailure| RecordError {
            catalog: wrapper.id.clone(),
            chart: chart.name.clone(),
            version: chart.version.clone(),
            resource: resource.to_string(),
            failure,
        };

        let resource = match chart.urls.first() {
            Some(url) => join_location(base, url),
            None => return Err(fail(index_location, RecordFailure::NoUrl)),
        };

        let bytes = self
            .provider
            .fetch(&resource)
            .map_err(|e: FetchError| fail(&resource, e.into()))?;

        if let Some(expected) = chart.digest.as_deref() {
            verify_digest(&resource, &bytes, expected).map_err(|e| fail(&resource, e))?;
        }

        let bundle = parse_bundle(&bytes).map_err(|e: ParseError| fail(&resource, e.into()))?;
        if bundle.metadata.is_none() {
            tracing::warn!(
                catalog = %wrapper.id,
                chart = %chart.name,
                version = %chart.version,
                location = %resource,
                "bundle has no Chart.yaml, keeping index metadata"
            );
        }
        bundle.apply_to(&mut chart);
        Ok(chart)
    }
}

fn resolve_universe(
    wrapper: &CatalogWrapper,
    location: &str,
    bytes: &[u8],
) -> Result<(CatalogSnapshot, Vec<RecordError>), LoadError> {
    let document = parse_packages(bytes).map_err(|source| parse_error(wrapper, location, source))?;
    let packages = document
        .packages
        .into_iter()
        .filter(|pkg| !wrapper.is_excluded(&pkg.name))
        .collect();
    Ok((CatalogSnapshot::from_packages(packages, Utc::now()), Vec::new()))
}

fn parse_error(wrapper: &CatalogWrapper, location: &str, source: ParseError) -> LoadError {
    LoadError::Parse {
        catalog: wrapper.id.clone(),
        location: location.to_string(),
        source,
    }
}

/// Checks a bundle against the index digest (hex SHA-256, optionally
/// prefixed with `sha256:`).
fn verify_digest(location: &str, bytes: &[u8], expected: &str) -> Result<(), RecordFailure> {
    let expected_hex = expected
        .strip_prefix("sha256:")
        .unwrap_or(expected)
        .to_ascii_lowercase();
    let actual = hex::encode(Sha256::digest(bytes));

    if actual != expected_hex {
        return Err(RecordFailure::Digest {
            location: location.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
