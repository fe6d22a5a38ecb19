//! Core data models used throughout the catalog service.
//!
//! These types represent the charts, packages, and configuration schemas
//! that flow from a repository index through the loader and out of the
//! HTTP API.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Normalized key used wherever chart or package names are compared
/// case-insensitively (exclusion lists and lookups).
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Kind of catalog source. Selects the index parser and the region rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CatalogType {
    /// A standard Helm chart repository (`index.yaml` + chart bundles).
    Helm,
    /// A flat JSON document of minimal packages.
    Universe,
}

impl CatalogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogType::Helm => "helm",
            CatalogType::Universe => "universe",
        }
    }
}

impl fmt::Display for CatalogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "helm" => Ok(CatalogType::Helm),
            "universe" => Ok(CatalogType::Universe),
            other => Err(format!(
                "unknown catalog type: '{}'. Must be helm or universe.",
                other
            )),
        }
    }
}

impl TryFrom<String> for CatalogType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CatalogType> for String {
    fn from(value: CatalogType) -> Self {
        value.as_str().to_string()
    }
}

/// Form rendering hint attached to a property (`x-form`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XForm {
    /// Templated expression used as the rendered value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

/// Platform override hint attached to a property (`x-onyxia`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XOnyxia {
    /// Templated expression that replaces the default at deploy time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite_default_with: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

/// A node of a chart configuration schema (`values.schema.json`).
///
/// Only the keywords the service reads or writes are typed; everything
/// else is carried through untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Property>>,
    #[serde(rename = "x-form", default, skip_serializing_if = "Option::is_none")]
    pub x_form: Option<XForm>,
    #[serde(rename = "x-onyxia", default, skip_serializing_if = "Option::is_none")]
    pub x_onyxia: Option<XOnyxia>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Property {
    /// An empty `object` schema, used when a chart ships no schema.
    pub fn object() -> Self {
        Self {
            kind: Some("object".to_string()),
            properties: Some(IndexMap::new()),
            ..Default::default()
        }
    }

    /// A leaf property with a type, title, description and default.
    pub fn leaf(kind: &str, title: &str, description: &str, default: Value) -> Self {
        Self {
            kind: Some(kind.to_string()),
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            default: Some(default),
            ..Default::default()
        }
    }

    /// Mutable access to the nested properties, creating the map if absent.
    pub fn properties_mut(&mut self) -> &mut IndexMap<String, Property> {
        self.properties.get_or_insert_with(IndexMap::new)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.as_ref().and_then(|p| p.get(name))
    }
}

/// A chart maintainer as declared in the index or `Chart.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maintainer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One version of a Helm chart.
///
/// Deserialized from a repository index record; `config` and
/// `maintainers` are completed from the chart bundle by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    #[serde(default)]
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,
    #[serde(default)]
    pub maintainers: Vec<Maintainer>,
    #[serde(default = "Property::object")]
    pub config: Property,
}

/// Minimal package record: a name and a configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pkg {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "Property::object")]
    pub config: Property,
}

/// A resolved package, either a full chart or a minimal package.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Package {
    Chart(Chart),
    Pkg(Pkg),
}

impl Package {
    pub fn name(&self) -> &str {
        match self {
            Package::Chart(chart) => &chart.name,
            Package::Pkg(pkg) => &pkg.name,
        }
    }

    pub fn config(&self) -> &Property {
        match self {
            Package::Chart(chart) => &chart.config,
            Package::Pkg(pkg) => &pkg.config,
        }
    }

    pub fn config_mut(&mut self) -> &mut Property {
        match self {
            Package::Chart(chart) => &mut chart.config,
            Package::Pkg(pkg) => &mut pkg.config,
        }
    }

    pub fn as_chart(&self) -> Option<&Chart> {
        match self {
            Package::Chart(chart) => Some(chart),
            Package::Pkg(_) => None,
        }
    }
}
