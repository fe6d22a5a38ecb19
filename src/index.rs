//! Repository index and chart bundle parsing.
//!
//! A Helm repository publishes an `index.yaml` listing every chart and its
//! versions, plus one gzip-compressed tarball per version:
//!
//! ```text
//! index.yaml
//! jupyter-1.2.0.tgz      ← jupyter/Chart.yaml
//!                          jupyter/values.schema.json
//!                          jupyter/templates/…
//! ```
//!
//! [`parse_index`] keeps the document order of chart names and merges
//! repeated names into one group. [`parse_bundle`] only reads the two
//! top-level files of a chart archive; sub-charts under `charts/` are
//! ignored.

use indexmap::IndexMap;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::io::Read;
use std::path::Component;

use crate::error::ParseError;
use crate::models::{Chart, Maintainer, Pkg, Property};

const CHART_METADATA_FILE: &str = "Chart.yaml";
const CHART_SCHEMA_FILE: &str = "values.schema.json";

/// A parsed `index.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryIndex {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub generated: Option<String>,
    /// Chart name → version records, in document order. The key is
    /// required; `entries:` with no value is an empty repository.
    #[serde(deserialize_with = "merge_entries")]
    pub entries: IndexMap<String, Vec<Chart>>,
}

impl RepositoryIndex {
    pub fn version_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

/// Deserializes the `entries` map, concatenating the versions of chart
/// names that appear more than once.
fn merge_entries<'de, D>(deserializer: D) -> Result<IndexMap<String, Vec<Chart>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = IndexMap<String, Vec<Chart>>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of chart names to version lists")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(IndexMap::new())
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(IndexMap::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries: IndexMap<String, Vec<Chart>> = IndexMap::new();
            while let Some((name, versions)) = map.next_entry::<String, Option<Vec<Chart>>>()? {
                let mut versions = versions.unwrap_or_default();
                for chart in &mut versions {
                    if chart.name.is_empty() {
                        chart.name = name.clone();
                    }
                }
                entries.entry(name).or_default().extend(versions);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_any(EntriesVisitor)
}

/// Parses a Helm repository index document.
///
/// An empty document, or one without an `entries` key, is rejected so that
/// a truncated response never replaces a loaded catalog.
pub fn parse_index(bytes: &[u8]) -> Result<RepositoryIndex, ParseError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ParseError::EmptyIndex);
    }
    Ok(serde_yaml_ng::from_slice(bytes)?)
}

/// The subset of `Chart.yaml` the catalog uses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub maintainers: Vec<Maintainer>,
}

/// Metadata extracted from one chart archive.
#[derive(Debug, Clone, Default)]
pub struct ChartBundle {
    pub metadata: Option<ChartMetadata>,
    pub schema: Option<Property>,
}

impl ChartBundle {
    /// Completes an index record with what the archive declares.
    ///
    /// Bundle maintainers win over the index record when present; a
    /// missing schema leaves the record's empty object schema.
    pub fn apply_to(self, chart: &mut Chart) {
        if let Some(metadata) = self.metadata {
            if !metadata.maintainers.is_empty() {
                chart.maintainers = metadata.maintainers;
            }
            if chart.description.is_none() {
                chart.description = metadata.description;
            }
        }
        if let Some(schema) = self.schema {
            chart.config = schema;
        }
    }
}

/// Reads `Chart.yaml` and `values.schema.json` from a gzip tar archive.
pub fn parse_bundle(bytes: &[u8]) -> Result<ChartBundle, ParseError> {
    let decoder = flate2::read::GzDecoder::new(bytes);
    let mut archive = tar::Archive::new(decoder);
    let mut bundle = ChartBundle::default();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        let parts: Vec<_> = path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        if parts.len() != 2 {
            continue;
        }
        let file_name = parts[1].as_os_str();

        if file_name == CHART_METADATA_FILE {
            let mut content = String::new();
            entry.read_to_string(&mut content)?;
            let metadata =
                serde_yaml_ng::from_str(&content).map_err(ParseError::ChartMetadata)?;
            bundle.metadata = Some(metadata);
        } else if file_name == CHART_SCHEMA_FILE {
            let mut content = Vec::new();
            entry.read_to_end(&mut content)?;
            let schema = serde_json::from_slice(&content).map_err(ParseError::Schema)?;
            bundle.schema = Some(schema);
        }
    }

    Ok(bundle)
}

/// A universe package document: `{ "packages": [ … ] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageDocument {
    #[serde(default)]
    pub packages: Vec<Pkg>,
}

pub fn parse_packages(bytes: &[u8]) -> Result<PackageDocument, ParseError> {
    serde_json::from_slice(bytes).map_err(ParseError::Packages)
}
