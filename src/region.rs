//! Deployment regions and catalog visibility.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::catalog::CatalogWrapper;
use crate::models::CatalogType;

/// Orchestration backend a region deploys to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ServiceType {
    Kubernetes,
    Marathon,
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "KUBERNETES" => Ok(ServiceType::Kubernetes),
            "MARATHON" => Ok(ServiceType::Marathon),
            other => Err(format!("unknown service type: '{}'", other)),
        }
    }
}

impl TryFrom<String> for ServiceType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServiceType> for String {
    fn from(value: ServiceType) -> Self {
        match value {
            ServiceType::Kubernetes => "KUBERNETES".to_string(),
            ServiceType::Marathon => "MARATHON".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Services {
    #[serde(rename = "type")]
    pub service_type: ServiceType,
}

/// A deployment target. Only its service type matters for visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub services: Services,
}

impl Region {
    pub fn new(id: &str, service_type: ServiceType) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            services: Services { service_type },
        }
    }
}

/// Whether `catalog` may be listed for callers in `region`.
///
/// Callers without a region see everything. Helm catalogs need a
/// Kubernetes region; every other catalog type is hidden.
pub fn is_enabled(region: Option<&Region>, catalog: &CatalogWrapper) -> bool {
    let Some(region) = region else {
        return true;
    };

    match catalog.catalog_type {
        CatalogType::Helm => region.services.service_type == ServiceType::Kubernetes,
        _ => false,
    }
}
