//! One-shot CLI commands: list, load and inspect catalogs without a server.
//!
//! These functions block on catalog fetches. From async code, run them on
//! a blocking thread.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::loader::LoadReport;
use crate::schema::{augment, augment_chart};
use crate::service::CatalogService;

/// Prints the configured catalogs. Nothing is fetched.
pub fn list_catalogs(config: &Config) -> Result<()> {
    println!(
        "{:<16} {:<10} {:<8} LOCATION",
        "CATALOG", "TYPE", "STATUS"
    );
    for catalog in &config.catalogs {
        println!(
            "{:<16} {:<10} {:<8} {}",
            catalog.id,
            catalog.catalog_type.as_str(),
            catalog.status,
            catalog.location
        );
    }
    Ok(())
}

/// Loads one catalog, or all of them, and prints what was found.
///
/// Record failures are reported but do not fail the command. A catalog
/// whose index cannot be loaded does.
pub fn run_load(config: &Config, catalog_id: Option<&str>) -> Result<()> {
    let service = CatalogService::from_config(config);

    let results = match catalog_id {
        Some(id) => vec![service.refresh(id).map_err(anyhow::Error::from)],
        None => service
            .load_all()
            .into_iter()
            .map(|r| r.map_err(anyhow::Error::from))
            .collect(),
    };

    let mut failed = 0;
    for result in results {
        match result {
            Ok(report) => print_report(&report),
            Err(e) => {
                eprintln!("Error: {}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} catalog(s) failed to load", failed);
    }
    Ok(())
}

fn print_report(report: &LoadReport) {
    println!(
        "{}: {} charts, {} versions, {} failed",
        report.catalog,
        report.charts,
        report.versions,
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  - {}", failure);
    }
}

/// Loads a catalog and prints one augmented package, or a single chart
/// version when `version` is given, as JSON.
pub fn run_show(
    config: &Config,
    catalog_id: &str,
    name: &str,
    version: Option<&str>,
) -> Result<()> {
    let service = CatalogService::from_config(config);
    service.refresh(catalog_id)?;

    let json = match version {
        Some(version) => {
            let mut chart = service.get_chart_by_version(catalog_id, name, version)?;
            augment_chart(&mut chart);
            serde_json::to_string_pretty(&chart)?
        }
        None => {
            let mut package = service.get_package(catalog_id, name)?;
            augment(&mut package);
            serde_json::to_string_pretty(&package)?
        }
    };
    println!("{}", json);
    Ok(())
}
