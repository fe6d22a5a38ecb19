//! Error taxonomy for catalog loading and lookups.
//!
//! Three families are kept apart:
//!
//! | Type | Scope | Effect |
//! |------|-------|--------|
//! | [`LoadError`] | index document of one catalog | the refresh is aborted, previous snapshot kept |
//! | [`RecordError`] | one chart version | the version is dropped, the load continues |
//! | [`NotFound`] | a lookup | reported to the caller (HTTP 404) |

use thiserror::Error;

/// Failure of a [`ResourceProvider`](crate::provider::ResourceProvider) fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("resource not found: {location}")]
    NotFound { location: String },

    #[error("timed out fetching {location}")]
    Timeout { location: String },

    #[error("HTTP {status} fetching {location}")]
    Http { location: String, status: u16 },

    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {location} failed: {message}")]
    Request { location: String, message: String },
}

impl FetchError {
    /// The location that could not be fetched.
    pub fn location(&self) -> &str {
        match self {
            FetchError::NotFound { location }
            | FetchError::Timeout { location }
            | FetchError::Http { location, .. }
            | FetchError::Io { location, .. }
            | FetchError::Request { location, .. } => location,
        }
    }
}

/// Failure to decode a repository index or a chart bundle.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid repository index: {0}")]
    Index(#[from] serde_yaml_ng::Error),

    #[error("repository index is empty")]
    EmptyIndex,

    #[error("invalid package document: {0}")]
    Packages(#[source] serde_json::Error),

    #[error("invalid chart archive: {0}")]
    Archive(#[from] std::io::Error),

    #[error("invalid Chart.yaml: {0}")]
    ChartMetadata(#[source] serde_yaml_ng::Error),

    #[error("invalid values.schema.json: {0}")]
    Schema(#[source] serde_json::Error),
}

/// Load-level failure: the catalog's index could not be obtained.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("catalog '{catalog}': cannot fetch index {location}: {source}")]
    Fetch {
        catalog: String,
        location: String,
        #[source]
        source: FetchError,
    },

    #[error("catalog '{catalog}': cannot parse index {location}: {source}")]
    Parse {
        catalog: String,
        location: String,
        #[source]
        source: ParseError,
    },
}

impl LoadError {
    pub fn catalog(&self) -> &str {
        match self {
            LoadError::Fetch { catalog, .. } | LoadError::Parse { catalog, .. } => catalog,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            LoadError::Fetch { location, .. } | LoadError::Parse { location, .. } => location,
        }
    }
}

/// Why a single chart version could not be resolved.
#[derive(Debug, Error)]
pub enum RecordFailure {
    #[error("no download URL in index record")]
    NoUrl,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("digest mismatch for {location}: expected {expected}, got {actual}")]
    Digest {
        location: String,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Per-record failure, isolated from the rest of the load.
#[derive(Debug, Error)]
#[error("catalog '{catalog}': chart {chart} {version} ({resource}): {failure}")]
pub struct RecordError {
    pub catalog: String,
    pub chart: String,
    pub version: String,
    /// Resource path of the bundle, or the index location when no URL exists.
    pub resource: String,
    #[source]
    pub failure: RecordFailure,
}

/// A lookup that matched nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("catalog not found: {0}")]
    Catalog(String),

    #[error("package not found: {catalog}/{name}")]
    Package { catalog: String, name: String },

    #[error("chart not found: {catalog}/{chart}")]
    Chart { catalog: String, chart: String },

    #[error("chart version not found: {catalog}/{chart} {version}")]
    Version {
        catalog: String,
        chart: String,
        version: String,
    },
}

/// Failure of an explicit catalog refresh.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error(transparent)]
    Load(#[from] LoadError),
}
